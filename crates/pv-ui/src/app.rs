//! Main application

use eframe::egui;
use pv_core::config::Config;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::detail;
use crate::file_list::{FileList, FileStatus};
use crate::jobs::ValidationJobs;

const APP_TITLE: &str = "PS4 PKG Validator";

/// How often to check for finished validations while any are running
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A message box waiting to be acknowledged
struct Notice {
    title: &'static str,
    message: String,
}

/// Main application state
pub struct PkgValidatorApp {
    /// Configuration
    config: Config,
    /// Dropped files and their results
    file_list: FileList,
    /// Background validations
    jobs: ValidationJobs,
    /// Pending message boxes, oldest first
    notices: VecDeque<Notice>,
    /// Show the Clear All confirmation
    show_clear_confirm: bool,
    /// Show about window
    show_about: bool,
}

impl PkgValidatorApp {
    /// Create the application and queue `initial` for validation
    pub fn new(config: Config, initial: Vec<PathBuf>) -> Self {
        let file_list = FileList::new(config.general.pkg_extension_only);
        let mut app = Self {
            config,
            file_list,
            jobs: ValidationJobs::new(),
            notices: VecDeque::new(),
            show_clear_confirm: false,
            show_about: false,
        };
        app.add_files(initial);
        app
    }

    /// Add files to the list and start validating the accepted ones
    pub fn add_files(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        for path in paths {
            match self.file_list.add(path.clone()) {
                Ok(id) => {
                    info!("Added {}", path.display());
                    self.jobs.submit(id, path);
                }
                Err(e) => {
                    debug!("Rejected {}: {}", path.display(), e);
                    self.notices.push_back(Notice {
                        title: e.title(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    pub fn file_list(&self) -> &FileList {
        &self.file_list
    }

    /// Move finished validations into the list
    fn collect_results(&mut self) {
        for done in self.jobs.poll() {
            if !self.file_list.complete(done.id, done.result) {
                // Cleared while the worker was still running
                debug!("Discarding result for {}", done.path.display());
            }
        }
    }

    fn clear_all(&mut self) {
        info!("Clearing {} file(s)", self.file_list.len());
        self.file_list.clear();
    }

    /// Open a file dialog to select packages
    fn open_pkg_dialog() -> Vec<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Open PS4 Package")
            .add_filter("PS4 Packages", &["pkg"])
            .add_filter("All Files", &["*"])
            .pick_files()
            .unwrap_or_default()
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.add_files(dropped);
        }
    }

    /// Dim the window while files are dragged over it
    fn show_drop_overlay(ctx: &egui::Context) {
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        if !hovering {
            return;
        }

        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("drop_overlay"),
        ));
        let rect = ctx.screen_rect();
        painter.rect_filled(rect, 0.0, egui::Color32::from_black_alpha(192));
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "Drop PKG files to validate",
            egui::FontId::proportional(24.0),
            egui::Color32::WHITE,
        );
    }

    fn show_file_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Files");
        ui.separator();

        if self.file_list.is_empty() {
            ui.label(egui::RichText::new("Drop .pkg files here").color(egui::Color32::GRAY));
            return;
        }

        let mut clicked = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            let selected = self.file_list.selected_index();
            for (index, entry) in self.file_list.entries().iter().enumerate() {
                let color = match &entry.status {
                    FileStatus::Pending => egui::Color32::GRAY,
                    FileStatus::Done(result) if result.is_valid() => egui::Color32::DARK_GREEN,
                    FileStatus::Done(_) => egui::Color32::RED,
                };
                let label = egui::RichText::new(entry.label()).color(color);
                if ui
                    .selectable_label(selected == Some(index), label)
                    .on_hover_text(entry.path.display().to_string())
                    .clicked()
                {
                    clicked = Some(index);
                }
            }
        });

        if let Some(index) = clicked {
            self.file_list.select(index);
        }
    }

    fn show_windows(&mut self, ctx: &egui::Context) {
        // Clear All confirmation
        if self.show_clear_confirm {
            let mut confirmed = false;
            let mut cancelled = false;
            egui::Window::new("Clear All")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(format!(
                        "Remove all {} file(s) from the list?",
                        self.file_list.len()
                    ));
                    ui.separator();
                    ui.horizontal(|ui| {
                        confirmed = ui.button("Yes").clicked();
                        cancelled = ui.button("No").clicked();
                    });
                });
            if confirmed {
                self.clear_all();
            }
            if confirmed || cancelled {
                self.show_clear_confirm = false;
            }
        }

        // About window
        if self.show_about {
            egui::Window::new("About")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.heading(APP_TITLE);
                        ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                        ui.add_space(10.0);
                        ui.separator();
                        ui.add_space(10.0);
                        ui.label("Checks PS4 package headers and reports");
                        ui.label("their identifiers, versions and firmware.");
                        ui.add_space(10.0);
                        ui.label("Licensed under GPL-3.0");
                    });
                });
        }

        // Oldest notice first
        let mut dismiss = false;
        if let Some(notice) = self.notices.front() {
            let mut open = true;
            egui::Window::new(notice.title)
                .open(&mut open)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(notice.message.as_str());
                    ui.separator();
                    if ui.button("OK").clicked() {
                        dismiss = true;
                    }
                });
            if !open {
                dismiss = true;
            }
        }
        if dismiss {
            self.notices.pop_front();
        }
    }
}

impl eframe::App for PkgValidatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.collect_results();
        self.handle_dropped_files(ctx);

        // Menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open PKG...").clicked() {
                        ui.close_menu();
                        let paths = Self::open_pkg_dialog();
                        self.add_files(paths);
                    }
                    let can_clear = !self.file_list.is_empty();
                    if ui.add_enabled(can_clear, egui::Button::new("Clear All")).clicked() {
                        ui.close_menu();
                        if self.config.general.confirm_clear {
                            self.show_clear_confirm = true;
                        } else {
                            self.clear_all();
                        }
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        self.show_about = true;
                        ui.close_menu();
                    }
                });
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("{} file(s)", self.file_list.len()));
                let pending = self.file_list.pending_count();
                if pending > 0 {
                    ui.separator();
                    ui.spinner();
                    ui.label(format!("{} validating", pending));
                }
            });
        });

        egui::SidePanel::left("file_list")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| self.show_file_list(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match self.file_list.selected() {
                Some(entry) => detail::show(ui, entry),
                None => {
                    ui.vertical_centered(|ui| {
                        ui.add_space(40.0);
                        ui.heading(APP_TITLE);
                        ui.label("Drag and drop .pkg files onto this window, or use File > Open PKG...");
                    });
                }
            });
        });

        self.show_windows(ctx);
        Self::show_drop_overlay(ctx);

        if self.jobs.in_flight() > 0 {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}

/// Run the application
pub fn run(config: Config, initial: Vec<PathBuf>) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([config.ui.window_width, config.ui.window_height])
            .with_min_inner_size([600.0, 400.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(PkgValidatorApp::new(config, initial)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_pkg::PkgBuilder;
    use tempfile::TempDir;

    fn wait_for_results(app: &mut PkgValidatorApp) {
        for _ in 0..200 {
            app.collect_results();
            if app.file_list.pending_count() == 0 {
                return;
            }
            std::thread::sleep(Duration::from_millis(25));
        }
        panic!("validations did not finish");
    }

    #[test]
    fn test_initial_files_validated() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let good = temp_dir.path().join("good.pkg");
        PkgBuilder::new().title_id("CUSA00001").write_to(&good).unwrap();

        let mut app = PkgValidatorApp::new(Config::default(), vec![good]);
        assert_eq!(app.file_list().len(), 1);
        wait_for_results(&mut app);

        let entry = app.file_list().selected().expect("nothing selected");
        assert!(entry.result().is_some_and(|r| r.is_valid()));
        assert_eq!(entry.label(), "✓ good.pkg");
    }

    #[test]
    fn test_rejected_files_raise_notices() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pkg = temp_dir.path().join("a.pkg");
        PkgBuilder::new().write_to(&pkg).unwrap();

        let mut app = PkgValidatorApp::new(Config::default(), Vec::new());
        app.add_files([pkg.clone(), pkg, temp_dir.path().join("notes.txt")]);

        assert_eq!(app.file_list().len(), 1);
        let titles: Vec<&str> = app.notices.iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Already Added", "Invalid File"]);
        wait_for_results(&mut app);
    }

    #[test]
    fn test_clear_discards_late_results() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pkg = temp_dir.path().join("a.pkg");
        PkgBuilder::new().write_to(&pkg).unwrap();

        let mut app = PkgValidatorApp::new(Config::default(), vec![pkg]);
        app.clear_all();
        assert!(app.file_list().is_empty());

        while app.jobs.in_flight() > 0 {
            app.collect_results();
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(app.file_list().is_empty());
    }

    #[test]
    fn test_re_added_file_gets_its_own_result() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pkg = temp_dir.path().join("a.pkg");
        std::fs::write(&pkg, b"short").unwrap();

        let mut app = PkgValidatorApp::new(Config::default(), vec![pkg.clone()]);
        let stale = app
            .jobs
            .recv_timeout(Duration::from_secs(10))
            .expect("validation timed out");
        assert!(!stale.result.is_valid());

        app.clear_all();
        PkgBuilder::new().title_id("CUSA00003").write_to(&pkg).unwrap();
        app.add_files([pkg]);

        // The first job's result arrives after the same path was added again
        assert!(!app.file_list.complete(stale.id, stale.result));
        assert_eq!(app.file_list().pending_count(), 1);

        wait_for_results(&mut app);
        let entry = app.file_list().selected().expect("nothing selected");
        assert!(entry.result().is_some_and(|r| r.is_valid()));
    }
}
