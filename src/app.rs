//! The egui application: library pane on the left, waveform editor in the
//! middle, metadata/tags below. All edits go through [`EditorSession`]; this
//! layer drains its events once per frame and keeps the playback engine and
//! the metadata store in step.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use egui::{Align, Color32, Key, RichText, TextStyle, Visuals};
use egui_extras::TableBuilder;

use crate::audio::AudioEngine;
use crate::audio_io::{self, read_audio_info};
use crate::config::AppConfig;
use crate::editor::{ClickContext, EditError, EditorEvent, EditorSession, FilterKind};
use crate::fsops::{self, DeleteTicket};
use crate::library::{MetaRecord, MetaStore};

pub mod waveform;

#[derive(Clone, Debug, Default)]
pub struct StartupConfig {
    pub open_folder: Option<PathBuf>,
    pub open_file: Option<PathBuf>,
    pub volume: Option<u8>,
}

pub struct SoundManager {
    pub audio: AudioEngine,
    config: AppConfig,
    root: Option<PathBuf>,
    files: Vec<PathBuf>,
    all_files: Vec<PathBuf>,
    selected: Option<usize>,
    search_query: String,

    session: Option<EditorSession>,
    current_path: Option<PathBuf>,

    store: Option<MetaStore>,
    tag_input: String,
    desc_input: String,
    desc_key: Option<String>,

    volume: u8,
    filter_index: usize,
    pitch_semitones: f32,
    trim_db: f32,
    status: String,

    drag_anchor: Option<f32>,
    rename_target: Option<PathBuf>,
    rename_input: String,
    rename_error: Option<String>,
    delete_tickets: Vec<DeleteTicket>,
}

impl SoundManager {
    pub fn new(cc: &eframe::CreationContext<'_>, startup: StartupConfig) -> Result<Self> {
        let mut visuals = Visuals::dark();
        visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(20, 20, 23);
        visuals.widgets.inactive.bg_fill = Color32::from_rgb(28, 28, 32);
        visuals.panel_fill = Color32::from_rgb(18, 18, 20);
        cc.egui_ctx.set_visuals(visuals);
        let mut style = (*cc.egui_ctx.style()).clone();
        style
            .text_styles
            .insert(TextStyle::Body, egui::FontId::proportional(15.0));
        style
            .text_styles
            .insert(TextStyle::Monospace, egui::FontId::monospace(13.0));
        cc.egui_ctx.set_style(style);

        let config = AppConfig::load();
        let audio = AudioEngine::new()?;
        let volume = startup.volume.unwrap_or(config.volume).min(100);
        audio.set_volume(volume);

        let mut app = Self {
            audio,
            config,
            root: None,
            files: Vec::new(),
            all_files: Vec::new(),
            selected: None,
            search_query: String::new(),
            session: None,
            current_path: None,
            store: None,
            tag_input: String::new(),
            desc_input: String::new(),
            desc_key: None,
            volume,
            filter_index: 0,
            pitch_semitones: 0.0,
            trim_db: -20.0,
            status: String::new(),
            drag_anchor: None,
            rename_target: None,
            rename_input: String::new(),
            rename_error: None,
            delete_tickets: Vec::new(),
        };

        let folder = startup.open_folder.or_else(|| app.config.root_dir.clone());
        if let Some(dir) = folder {
            app.set_root(dir);
        }
        if let Some(file) = startup.open_file {
            app.open_file(&file);
        }
        Ok(app)
    }

    fn set_root(&mut self, dir: PathBuf) {
        match MetaStore::open(&dir) {
            Ok(mut store) => {
                store.prune_missing(&dir);
                self.store = Some(store);
            }
            Err(e) => {
                log::warn!("meta store unavailable: {e:#}");
                self.store = None;
            }
        }
        self.config.root_dir = Some(dir.clone());
        if let Err(e) = self.config.save() {
            log::warn!("config save failed: {e:#}");
        }
        self.root = Some(dir);
        self.rescan();
    }

    fn rescan(&mut self) {
        self.all_files.clear();
        if let Some(root) = &self.root {
            self.all_files = fsops::scan_audio_files(root);
        }
        self.apply_filter_from_search();
        self.selected = None;
    }

    fn apply_filter_from_search(&mut self) {
        let q = self.search_query.to_lowercase();
        if q.is_empty() {
            self.files = self.all_files.clone();
        } else {
            self.files = self
                .all_files
                .iter()
                .filter(|p| {
                    p.file_name()
                        .and_then(|s| s.to_str())
                        .map(|s| s.to_lowercase().contains(&q))
                        .unwrap_or(false)
                })
                .cloned()
                .collect();
        }
    }

    fn store_key(&self, path: &Path) -> Option<String> {
        let root = self.root.as_deref()?;
        let rel = path.strip_prefix(root).unwrap_or(path);
        Some(rel.to_string_lossy().replace('\\', "/"))
    }

    fn ensure_record(&mut self, path: &Path) {
        let Some(key) = self.store_key(path) else { return };
        let Some(store) = &mut self.store else { return };
        if store.get(&key).is_some() {
            return;
        }
        match read_audio_info(path) {
            Ok(info) => {
                store.upsert(&key, MetaRecord::from_info(&info));
                if let Err(e) = store.save() {
                    log::warn!("meta store save failed: {e:#}");
                }
            }
            Err(e) => log::warn!("probe failed for {}: {e:#}", path.display()),
        }
    }

    fn open_file(&mut self, path: &Path) {
        self.audio.stop();
        match audio_io::decode_buffer(path) {
            Ok(buffer) => {
                let depth = self.config.undo_depth.max(1);
                let mut session = EditorSession::with_history_depth(buffer, depth);
                let _ = session.drain_events();
                self.reload_engine(&session);
                self.session = Some(session);
                self.current_path = Some(path.to_path_buf());
                self.status = format!("Loaded {}", path.display());
                self.ensure_record(path);
            }
            Err(e) => {
                log::error!("decode failed for {}: {e:#}", path.display());
                self.status = format!("Failed to load {}: {e}", path.display());
            }
        }
    }

    fn reload_engine(&self, session: &EditorSession) {
        let (samples, _frame) = session.playback_source();
        self.audio.load(samples, session.buffer().sample_rate());
    }

    /// Applies the session's queued change notifications to the engine and
    /// the status line.
    fn drain_session_events(&mut self) {
        let Some(session) = &mut self.session else { return };
        let events = session.drain_events();
        let mut reload = false;
        for event in &events {
            match event {
                EditorEvent::BufferReplaced | EditorEvent::PlaybackSourceChanged => reload = true,
                EditorEvent::SelectionChanged(_) | EditorEvent::ViewChanged => {}
                EditorEvent::Status(msg) => self.status = msg.clone(),
            }
        }
        if reload {
            let (samples, _frame) = session.playback_source();
            self.audio.load(samples, session.buffer().sample_rate());
        }
    }

    fn report_edit(&mut self, result: Result<(), EditError>) {
        if let Err(e) = result {
            self.status = e.to_string();
        }
        self.drain_session_events();
    }

    fn save_current(&mut self) {
        let Some(session) = &self.session else { return };
        let suggested = self
            .current_path
            .as_ref()
            .and_then(|p| p.file_stem().and_then(|s| s.to_str()))
            .map(|s| format!("{s}_edit.wav"))
            .unwrap_or_else(|| "edited.wav".to_string());
        let mut dialog = rfd::FileDialog::new()
            .add_filter("WAV", &["wav"])
            .set_file_name(suggested);
        if let Some(dir) = self.root.clone() {
            dialog = dialog.set_directory(dir);
        }
        let Some(dest) = dialog.save_file() else { return };
        match audio_io::write_wav_mono(&dest, session.buffer().samples(), session.buffer().sample_rate())
        {
            Ok(()) => {
                self.status = format!("Saved {}", dest.display());
                if let Some(session) = &mut self.session {
                    session.mark_saved();
                }
                self.rescan();
                self.ensure_record(&dest);
            }
            Err(e) => {
                log::error!("save failed: {e:#}");
                self.status = format!("Save failed: {e}");
            }
        }
    }

    fn import_file(&mut self) {
        let Some(root) = self.root.clone() else {
            self.status = "Choose a library folder first".into();
            return;
        };
        let Some(src) = rfd::FileDialog::new()
            .add_filter("Audio", audio_io::SUPPORTED_EXTS)
            .pick_file()
        else {
            return;
        };
        match fsops::import_file(&src, &root) {
            Ok(dest) => {
                self.status = format!("Imported {}", dest.display());
                self.rescan();
                self.ensure_record(&dest);
            }
            Err(e) => self.status = format!("Import failed: {e}"),
        }
    }

    fn delete_path(&mut self, path: &Path) {
        match fsops::soft_delete(path) {
            Ok(ticket) => {
                if let (Some(key), Some(store)) = (self.store_key(path), self.store.as_mut()) {
                    store.remove(&key);
                    let _ = store.save();
                }
                if self.current_path.as_deref() == Some(path) {
                    self.audio.stop();
                    self.session = None;
                    self.current_path = None;
                }
                self.status = format!("Deleted {} (undo available)", path.display());
                self.delete_tickets.push(ticket);
                self.rescan();
            }
            Err(e) => self.status = format!("Delete failed: {e}"),
        }
    }

    fn undo_last_delete(&mut self) {
        let Some(ticket) = self.delete_tickets.pop() else {
            self.status = "Nothing to restore".into();
            return;
        };
        match fsops::undo_delete(&ticket) {
            Ok(()) => {
                self.status = format!("Restored {}", ticket.original.display());
                self.rescan();
                self.ensure_record(&ticket.original);
            }
            Err(e) => {
                self.status = format!("Restore failed: {e}");
                self.delete_tickets.push(ticket);
            }
        }
    }

    fn apply_rename(&mut self) {
        let Some(from) = self.rename_target.clone() else { return };
        match fsops::rename_file(&from, &self.rename_input) {
            Ok(to) => {
                if let (Some(old_key), Some(new_key)) =
                    (self.store_key(&from), self.store_key(&to))
                {
                    if let Some(store) = &mut self.store {
                        store.rename(&old_key, &new_key);
                        let _ = store.save();
                    }
                }
                if self.current_path.as_deref() == Some(from.as_path()) {
                    self.current_path = Some(to);
                }
                self.rename_target = None;
                self.rename_error = None;
                self.rescan();
            }
            Err(e) => self.rename_error = Some(e.to_string()),
        }
    }

    fn play_current(&mut self, reverse: bool) {
        let Some(session) = &mut self.session else { return };
        let (samples, frame) = session.playback_source();
        let rate = session.buffer().sample_rate();
        self.audio.load(samples, rate);
        if reverse {
            self.audio.play_reverse();
        } else {
            self.audio.play();
        }
        // keep the playhead mapped into buffer space
        let _ = frame;
        self.drain_session_events();
    }

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.menu_button("Library", |ui| {
                if ui.button("Choose folder...").clicked() {
                    if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                        self.set_root(dir);
                    }
                    ui.close_menu();
                }
                if ui.button("Import file...").clicked() {
                    self.import_file();
                    ui.close_menu();
                }
                if ui.button("New folder...").clicked() {
                    if let Some(root) = self.root.clone() {
                        match fsops::create_folder(&root, "new_folder") {
                            Ok(dir) => self.status = format!("Created {}", dir.display()),
                            Err(e) => self.status = format!("Create failed: {e}"),
                        }
                        self.rescan();
                    }
                    ui.close_menu();
                }
                if ui.button("Undo delete").clicked() {
                    self.undo_last_delete();
                    ui.close_menu();
                }
            });
            if !self.all_files.is_empty() {
                let label = if self.search_query.is_empty() {
                    format!("Files: {}", self.all_files.len())
                } else {
                    format!("Files: {} / {}", self.files.len(), self.all_files.len())
                };
                ui.label(RichText::new(label).monospace());
            }
            ui.separator();
            ui.label("Volume");
            if ui
                .add(egui::Slider::new(&mut self.volume, 0..=100))
                .changed()
            {
                self.audio.set_volume(self.volume);
                self.config.volume = self.volume;
                if let Err(e) = self.config.save() {
                    log::warn!("config save failed: {e:#}");
                }
            }
            ui.separator();
            let playing = self.audio.is_busy();
            let paused = self.audio.is_paused();
            if ui.button("Play").clicked() {
                self.play_current(false);
            }
            if ui.button("Reverse").clicked() {
                self.play_current(true);
            }
            if playing && !paused {
                if ui.button("Pause").clicked() {
                    self.audio.pause();
                }
            } else if ui.button("Resume").clicked() {
                self.audio.resume();
            }
            if ui.button("Stop").clicked() {
                self.audio.stop();
                if let Some(session) = &mut self.session {
                    let _ = session.update_playhead(0);
                }
            }
            ui.separator();
            if ui.button("Save As...").clicked() {
                self.save_current();
            }
        });
    }

    fn file_pane(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let te = egui::TextEdit::singleline(&mut self.search_query).hint_text("Search...");
            if ui.add(te).changed() {
                self.apply_filter_from_search();
            }
            if !self.search_query.is_empty() && ui.button("x").clicked() {
                self.search_query.clear();
                self.apply_filter_from_search();
            }
        });
        ui.separator();
        let mut to_open: Option<PathBuf> = None;
        let mut to_rename: Option<PathBuf> = None;
        let mut to_delete: Option<PathBuf> = None;
        let text_height = egui::TextStyle::Body.resolve(ui.style()).size;
        let row_h = text_height * 1.5;
        let table = TableBuilder::new(ui)
            .striped(true)
            .sense(egui::Sense::click())
            .cell_layout(egui::Layout::left_to_right(Align::Center))
            .column(egui_extras::Column::initial(170.0).resizable(true))
            .column(egui_extras::Column::initial(55.0).resizable(true))
            .column(egui_extras::Column::remainder());
        table
            .header(row_h, |mut header| {
                header.col(|ui| {
                    ui.label(RichText::new("File").strong());
                });
                header.col(|ui| {
                    ui.label(RichText::new("Length").strong());
                });
                header.col(|ui| {
                    ui.label(RichText::new("Tags").strong());
                });
            })
            .body(|body| {
                body.rows(row_h, self.files.len(), |mut row| {
                    let row_idx = row.index();
                    row.set_selected(self.selected == Some(row_idx));
                    let path = self.files[row_idx].clone();
                    let name = path
                        .file_name()
                        .and_then(|s| s.to_str())
                        .unwrap_or("(invalid)")
                        .to_string();
                    let record = self
                        .store_key(&path)
                        .and_then(|key| self.store.as_ref().and_then(|s| s.get(&key).cloned()));
                    row.col(|ui| {
                        let resp = ui
                            .add(
                                egui::Label::new(&name)
                                    .sense(egui::Sense::click())
                                    .truncate(),
                            )
                            .on_hover_text(&name);
                        if resp.clicked() {
                            self.selected = Some(row_idx);
                        }
                        if resp.double_clicked() {
                            self.selected = Some(row_idx);
                            to_open = Some(path.clone());
                        }
                        resp.context_menu(|ui| {
                            if ui.button("Open").clicked() {
                                to_open = Some(path.clone());
                                ui.close_menu();
                            }
                            if ui.button("Rename...").clicked() {
                                to_rename = Some(path.clone());
                                ui.close_menu();
                            }
                            if ui.button("Delete").clicked() {
                                to_delete = Some(path.clone());
                                ui.close_menu();
                            }
                        });
                    });
                    row.col(|ui| {
                        let text = record
                            .as_ref()
                            .map(|r| format_duration(r.duration_secs))
                            .unwrap_or_else(|| "...".into());
                        ui.label(RichText::new(text).monospace());
                    });
                    row.col(|ui| {
                        if let Some(r) = &record {
                            ui.label(RichText::new(r.tags.join(", ")).monospace());
                        }
                    });
                });
            });
        if let Some(p) = to_open {
            self.open_file(&p);
        }
        if let Some(p) = to_rename {
            self.rename_input = p
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_string();
            self.rename_target = Some(p);
            self.rename_error = None;
        }
        if let Some(p) = to_delete {
            self.delete_path(&p);
        }
    }

    fn editor_pane(&mut self, ui: &mut egui::Ui) {
        let Some(path) = self.current_path.clone() else {
            ui.centered_and_justified(|ui| {
                ui.label("Double-click a file to open it in the editor.");
            });
            return;
        };
        ui.horizontal(|ui| {
            ui.label(RichText::new(path.display().to_string()).monospace());
            if self.session.as_ref().map(|s| s.is_dirty()).unwrap_or(false) {
                ui.label(RichText::new("(modified)").color(Color32::from_rgb(220, 180, 60)));
            }
        });
        ui.separator();

        self.edit_controls(ui);
        ui.separator();

        let avail = ui.available_size();
        let wave_h = (avail.y - 8.0).clamp(180.0, avail.y.max(180.0));
        let mut pending: Option<PlotAction> = None;
        if let Some(session) = &mut self.session {
            let plot = waveform::draw_waveform(ui, session, wave_h);
            if plot.response.drag_started() {
                self.drag_anchor = plot.pointer_sample;
            }
            if plot.response.dragged() {
                if let (Some(a), Some(b)) = (self.drag_anchor, plot.pointer_sample) {
                    session.drag_select(a, b);
                }
            }
            if plot.response.drag_stopped() {
                self.drag_anchor = None;
            }
            if plot.response.clicked() {
                if let Some(x) = plot.pointer_sample {
                    session.click_primary(x);
                }
            }
            let inside = plot
                .pointer_sample
                .map(|x| session.click_context(x) == ClickContext::InsideSelection)
                .unwrap_or(false);
            plot.response.context_menu(|ui| {
                if inside {
                    if ui.button("Zoom in").clicked() {
                        pending = Some(PlotAction::ZoomIn);
                        ui.close_menu();
                    }
                    if ui.button("Crop selected").clicked() {
                        pending = Some(PlotAction::CropTo);
                        ui.close_menu();
                    }
                    if ui.button("Crop unselected").clicked() {
                        pending = Some(PlotAction::CropOut);
                        ui.close_menu();
                    }
                }
                if ui.button("Zoom out").clicked() {
                    pending = Some(PlotAction::ZoomOut);
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Undo").clicked() {
                    pending = Some(PlotAction::Undo);
                    ui.close_menu();
                }
                if ui.button("Redo").clicked() {
                    pending = Some(PlotAction::Redo);
                    ui.close_menu();
                }
                if ui.button("Reset plot").clicked() {
                    pending = Some(PlotAction::Reset);
                    ui.close_menu();
                }
            });
        }
        if let Some(action) = pending {
            self.run_plot_action(action);
        }
    }

    fn edit_controls(&mut self, ui: &mut egui::Ui) {
        let mut filter_clicked = false;
        let mut pitch_clicked = false;
        let mut trim_clicked = false;
        let mut undo_clicked = false;
        let mut redo_clicked = false;
        let mut reset_clicked = false;
        let (can_undo, can_redo) = self
            .session
            .as_ref()
            .map(|s| (s.can_undo(), s.can_redo()))
            .unwrap_or((false, false));
        ui.horizontal_wrapped(|ui| {
            egui::ComboBox::from_label("Filter")
                .selected_text(
                    FilterKind::from_index(self.filter_index)
                        .map(|k| k.label())
                        .unwrap_or("?"),
                )
                .show_ui(ui, |ui| {
                    for (i, kind) in FilterKind::ALL.iter().enumerate() {
                        ui.selectable_value(&mut self.filter_index, i, kind.label());
                    }
                });
            filter_clicked = ui.button("Apply filter").clicked();
            ui.separator();
            ui.label("Pitch");
            ui.add(
                egui::DragValue::new(&mut self.pitch_semitones)
                    .clamp_range(-12.0..=12.0)
                    .speed(0.1)
                    .fixed_decimals(1)
                    .suffix(" st"),
            );
            pitch_clicked = ui.button("Shift").clicked();
            ui.separator();
            ui.label("Trim");
            ui.add(
                egui::DragValue::new(&mut self.trim_db)
                    .clamp_range(-80.0..=0.0)
                    .speed(0.5)
                    .fixed_decimals(1)
                    .suffix(" dB"),
            );
            trim_clicked = ui.button("Gate").clicked();
            ui.separator();
            undo_clicked = ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked();
            redo_clicked = ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked();
            reset_clicked = ui.button("Reset").clicked();
        });
        if filter_clicked {
            let index = self.filter_index;
            let result = self
                .session
                .as_mut()
                .map(|s| s.apply_filter(index).map(|_| ()))
                .unwrap_or(Ok(()));
            self.report_edit(result);
        }
        if pitch_clicked {
            let semis = self.pitch_semitones;
            let result = self
                .session
                .as_mut()
                .map(|s| s.pitch_shift(semis))
                .unwrap_or(Ok(()));
            self.report_edit(result);
        }
        if trim_clicked {
            let db = self.trim_db;
            let result = self
                .session
                .as_mut()
                .map(|s| s.trim(db).map(|_| ()))
                .unwrap_or(Ok(()));
            self.report_edit(result);
        }
        if undo_clicked {
            self.run_plot_action(PlotAction::Undo);
        }
        if redo_clicked {
            self.run_plot_action(PlotAction::Redo);
        }
        if reset_clicked {
            self.run_plot_action(PlotAction::Reset);
        }
    }

    fn run_plot_action(&mut self, action: PlotAction) {
        let Some(session) = &mut self.session else { return };
        match action {
            PlotAction::ZoomIn => {
                let r = session.zoom_into_selection();
                self.report_edit(r);
                return;
            }
            PlotAction::ZoomOut => {
                let r = session.zoom_out();
                self.report_edit(r);
                return;
            }
            PlotAction::CropTo => {
                let r = session.crop_to_selection();
                self.report_edit(r);
                return;
            }
            PlotAction::CropOut => {
                let r = session.crop_out_selection();
                self.report_edit(r);
                return;
            }
            PlotAction::Undo => {
                session.undo();
            }
            PlotAction::Redo => {
                session.redo();
            }
            PlotAction::Reset => {
                if session.reset_to_origin() {
                    self.status = "Reset to original".into();
                }
            }
        }
        self.drain_session_events();
    }

    fn metadata_pane(&mut self, ui: &mut egui::Ui) {
        let Some(path) = self
            .selected
            .and_then(|i| self.files.get(i).cloned())
            .or_else(|| self.current_path.clone())
        else {
            return;
        };
        self.ensure_record(&path);
        let Some(key) = self.store_key(&path) else { return };
        if self.desc_key.as_deref() != Some(key.as_str()) {
            self.desc_input = self
                .store
                .as_ref()
                .and_then(|s| s.get(&key))
                .map(|r| r.description.clone())
                .unwrap_or_default();
            self.desc_key = Some(key.clone());
        }
        let mut add_tag: Option<String> = None;
        let mut remove_tag: Option<String> = None;
        let mut desc_changed = false;
        if let Some(record) = self.store.as_ref().and_then(|s| s.get(&key)) {
            ui.horizontal_wrapped(|ui| {
                ui.label(
                    RichText::new(format!(
                        "{}  |  {:.2} s  |  {} ch  |  {} Hz  |  {} bytes",
                        key,
                        record.duration_secs,
                        record.channels,
                        record.sample_rate,
                        record.file_size
                    ))
                    .monospace(),
                );
            });
            ui.horizontal_wrapped(|ui| {
                ui.label("Tags:");
                for tag in &record.tags {
                    if ui.button(format!("{tag} x")).clicked() {
                        remove_tag = Some(tag.clone());
                    }
                }
                let te = egui::TextEdit::singleline(&mut self.tag_input)
                    .hint_text("add tag")
                    .desired_width(120.0);
                let resp = ui.add(te);
                let submit = resp.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
                if (ui.button("+").clicked() || submit) && !self.tag_input.trim().is_empty() {
                    add_tag = Some(self.tag_input.trim().to_string());
                    self.tag_input.clear();
                }
            });
            ui.horizontal(|ui| {
                ui.label("Description:");
                let te = egui::TextEdit::singleline(&mut self.desc_input)
                    .hint_text("notes about this sound")
                    .desired_width(f32::INFINITY);
                let resp = ui.add(te);
                desc_changed = resp.lost_focus() && self.desc_input != record.description;
            });
        }
        if let Some(store) = &mut self.store {
            let mut changed = false;
            if let Some(tag) = add_tag {
                changed |= store.add_tag(&key, &tag);
            }
            if let Some(tag) = remove_tag {
                changed |= store.remove_tag(&key, &tag);
            }
            if desc_changed {
                changed |= store.set_description(&key, &self.desc_input);
            }
            if changed {
                if let Err(e) = store.save() {
                    log::warn!("meta store save failed: {e:#}");
                }
            }
        }
    }

    fn rename_dialog(&mut self, ctx: &egui::Context) {
        if self.rename_target.is_none() {
            return;
        }
        let mut open = true;
        let mut apply = false;
        let mut cancel = false;
        egui::Window::new("Rename")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.text_edit_singleline(&mut self.rename_input);
                if let Some(err) = &self.rename_error {
                    ui.colored_label(Color32::from_rgb(240, 100, 100), err);
                }
                ui.horizontal(|ui| {
                    apply = ui.button("Rename").clicked()
                        || ui.input(|i| i.key_pressed(Key::Enter));
                    cancel = ui.button("Cancel").clicked();
                });
            });
        if apply {
            self.apply_rename();
        }
        if cancel || !open {
            self.rename_target = None;
            self.rename_error = None;
        }
    }
}

fn format_duration(secs: f32) -> String {
    let s = if secs.is_finite() && secs >= 0.0 { secs } else { 0.0 };
    let total = s.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[derive(Clone, Copy)]
enum PlotAction {
    ZoomIn,
    ZoomOut,
    CropTo,
    CropOut,
    Undo,
    Redo,
    Reset,
}

impl eframe::App for SoundManager {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // playhead follows the engine while audio runs
        if self.audio.is_busy() {
            let elapsed = self.audio.elapsed_ms();
            if let Some(session) = &mut self.session {
                let _ = session.update_playhead(elapsed);
            }
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        if ctx.input(|i| i.key_pressed(Key::Space)) {
            if self.audio.is_busy() {
                if self.audio.is_paused() {
                    self.audio.resume();
                } else {
                    self.audio.pause();
                }
            } else {
                self.play_current(false);
            }
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| self.top_bar(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(&self.status).monospace());
                ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                    if let Some(session) = &self.session {
                        ui.label(
                            RichText::new(format!("history: {}", session.history_depth()))
                                .monospace(),
                        );
                    }
                });
            });
        });
        egui::SidePanel::left("files")
            .default_width(260.0)
            .show(ctx, |ui| self.file_pane(ui));
        egui::TopBottomPanel::bottom("meta")
            .resizable(false)
            .show(ctx, |ui| self.metadata_pane(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.editor_pane(ui));

        self.rename_dialog(ctx);
        self.drain_session_events();
    }
}
