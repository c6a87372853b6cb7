use eframe::egui;
use egui::{Color32, Pos2, Rect, TextureHandle, TextureOptions, Vec2};
use rfd::FileDialog;

use crate::canvas::{Brush, Canvas, BACKGROUND};
use crate::history::History;

/// Fraction of the viewport the drawing surface occupies.
const CANVAS_WIDTH_FRACTION: f32 = 0.8;
const CANVAS_HEIGHT_FRACTION: f32 = 0.6;

const MIN_BRUSH_WIDTH: i32 = 1;
const MAX_BRUSH_WIDTH: i32 = 20;

#[derive(PartialEq, Clone, Copy)]
pub enum Tool {
    Draw,
    Erase,
}

pub struct SketchApp {
    canvas: Canvas,
    history: History,
    current_tool: Tool,
    brush_color: Color32,
    brush_width: i32,
    last_position: Option<(i32, i32)>,
    is_drawing: bool,
    texture: Option<TextureHandle>,
    texture_dirty: bool,
    error_message: Option<String>,
}

impl Default for SketchApp {
    fn default() -> Self {
        Self {
            canvas: Canvas::new(800, 600),
            history: History::default(),
            current_tool: Tool::Draw,
            brush_color: Color32::BLACK,
            brush_width: 5,
            last_position: None,
            is_drawing: false,
            texture: None,
            texture_dirty: true,
            error_message: None,
        }
    }
}

impl SketchApp {
    /// Effective brush for the current pointer event: the eraser is just a
    /// brush loaded with the background color.
    fn active_brush(&self) -> Brush {
        let color = match self.current_tool {
            Tool::Draw => self.brush_color,
            Tool::Erase => BACKGROUND,
        };
        Brush {
            color,
            width: self.brush_width,
        }
    }

    /// Capture the frame and push it onto the history. Called once per
    /// finished stroke or clear, never mid-stroke.
    fn commit(&mut self) {
        self.history.commit(self.canvas.capture());
    }

    fn undo(&mut self) {
        if let Some(snapshot) = self.history.undo() {
            self.canvas.restore(snapshot);
            self.texture_dirty = true;
        }
    }

    fn redo(&mut self) {
        if let Some(snapshot) = self.history.redo() {
            self.canvas.restore(snapshot);
            self.texture_dirty = true;
        }
    }

    fn clear(&mut self) {
        self.canvas.clear();
        self.commit();
        self.texture_dirty = true;
    }

    fn save_png(&mut self) {
        if let Some(path) = FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name("drawing.png")
            .save_file()
        {
            if let Err(e) = self.canvas.save_png(&path) {
                log::error!("saving {} failed: {e}", path.display());
                self.error_message = Some(format!("Could not save image: {e}"));
            } else {
                log::info!("saved drawing to {}", path.display());
            }
        }
    }

    /// Track the viewport and size the surface to a fraction of it. Resizing
    /// blanks the surface; the previous frame stays reachable through undo.
    fn fit_canvas_to_viewport(&mut self, ctx: &egui::Context) {
        let screen = ctx.screen_rect();
        let width = (screen.width() * CANVAS_WIDTH_FRACTION).round().max(1.0) as usize;
        let height = (screen.height() * CANVAS_HEIGHT_FRACTION).round().max(1.0) as usize;

        if width != self.canvas.width() || height != self.canvas.height() {
            log::warn!("canvas resized to {width}x{height}, contents cleared");
            self.canvas.resize(width, height);
            self.last_position = None;
            self.is_drawing = false;
            self.texture_dirty = true;
        }
    }

    fn update_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_dirty {
            return;
        }
        let width = self.canvas.width();
        let height = self.canvas.height();

        let mut image_data = vec![0_u8; width * height * 4];
        for y in 0..height {
            for x in 0..width {
                let color = self.canvas.get(x, y).unwrap_or(BACKGROUND);
                let idx = (y * width + x) * 4;
                image_data[idx] = color.r();
                image_data[idx + 1] = color.g();
                image_data[idx + 2] = color.b();
                image_data[idx + 3] = color.a();
            }
        }

        let color_image = egui::ColorImage::from_rgba_unmultiplied([width, height], &image_data);
        self.texture = Some(ctx.load_texture("canvas", color_image, TextureOptions::NEAREST));
        self.texture_dirty = false;
    }
}

impl eframe::App for SketchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.fit_canvas_to_viewport(ctx);
        self.update_texture(ctx);

        // Keyboard shortcuts
        let ctrl = ctx.input(|i| i.modifiers.ctrl);
        let shift = ctx.input(|i| i.modifiers.shift);
        if ctrl {
            if ctx.input(|i| i.key_pressed(egui::Key::Z)) && !shift {
                self.undo();
            }
            if ctx.input(|i| i.key_pressed(egui::Key::Y))
                || shift && ctx.input(|i| i.key_pressed(egui::Key::Z))
            {
                self.redo();
            }
            if ctx.input(|i| i.key_pressed(egui::Key::S)) {
                self.save_png();
            }
        }

        if self.error_message.is_some() {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(self.error_message.as_deref().unwrap_or_default());
                    if ui.button("OK").clicked() {
                        self.error_message = None;
                    }
                });
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Clear").clicked() {
                    self.clear();
                }
                if ui
                    .add_enabled(self.history.can_undo(), egui::Button::new("Undo"))
                    .clicked()
                {
                    self.undo();
                }
                if ui
                    .add_enabled(self.history.can_redo(), egui::Button::new("Redo"))
                    .clicked()
                {
                    self.redo();
                }
                if ui.button("Save PNG").clicked() {
                    self.save_png();
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label("Ctrl+Z undo | Ctrl+Y redo | Ctrl+S save");
                });
            });
        });

        egui::SidePanel::right("tools_panel").show(ctx, |ui| {
            ui.vertical(|ui| {
                ui.heading("Tools");
                if ui
                    .selectable_label(self.current_tool == Tool::Draw, "Draw")
                    .clicked()
                {
                    self.current_tool = Tool::Draw;
                }
                if ui
                    .selectable_label(self.current_tool == Tool::Erase, "Erase")
                    .clicked()
                {
                    self.current_tool = Tool::Erase;
                }

                ui.add_space(10.0);
                ui.label("Brush Size:");
                ui.add(
                    egui::DragValue::new(&mut self.brush_width)
                        .speed(0.1)
                        .clamp_range(MIN_BRUSH_WIDTH..=MAX_BRUSH_WIDTH),
                );

                ui.add_space(10.0);
                ui.label("Color:");
                ui.color_edit_button_srgba(&mut self.brush_color);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available_size = ui.available_size();
            let canvas_width = self.canvas.width() as f32;
            let canvas_height = self.canvas.height() as f32;
            let scale = (available_size.x / canvas_width)
                .min(available_size.y / canvas_height)
                .min(1.0);
            let scaled_size = Vec2::new(canvas_width * scale, canvas_height * scale);
            let canvas_rect =
                Rect::from_center_size(ui.available_rect_before_wrap().center(), scaled_size);

            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());

            if let Some(texture) = &self.texture {
                painter.image(
                    texture.id(),
                    canvas_rect,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );
            }

            let to_canvas = egui::emath::RectTransform::from_to(
                canvas_rect,
                Rect::from_min_size(Pos2::ZERO, Vec2::new(canvas_width, canvas_height)),
            );

            if response.dragged() || response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let canvas_pos = to_canvas.transform_pos(pos);
                    let x = canvas_pos.x as i32;
                    let y = canvas_pos.y as i32;
                    let brush = self.active_brush();

                    if let Some(last_pos) = self.last_position {
                        self.canvas.draw_line(last_pos, (x, y), brush);
                    } else {
                        self.canvas.draw_point(x, y, brush);
                    }
                    self.last_position = Some((x, y));
                    self.is_drawing = true;
                    self.texture_dirty = true;
                }
            } else if self.is_drawing {
                // Stroke ended: the single commit point for pointer input.
                self.is_drawing = false;
                self.last_position = None;
                self.commit();
            }
        });
    }
}
