#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use eframe::egui;

mod index;
mod selection;
mod sidebar;
mod tree;

use index::{split_location, SourceIndex};
use selection::{HighlightRange, SelectionEffect, SelectionEvent, SelectionState};
use sidebar::{SidebarToggle, ToggleEffect, NARROW_BREAKPOINT, SIDEBAR_PREF_KEY};
use tree::{SidebarTree, TreeDir};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "srcview")]
#[command(about = "A lightweight viewer for generated source trees", long_about = None)]
struct Args {
    /// Root directory of a generated source tree (holds index.json and src/)
    root: Option<PathBuf>,

    /// Index file to use instead of <root>/index.json
    #[arg(short, long)]
    index: Option<PathBuf>,

    /// Page to open at startup, relative to the root, e.g. src/demo/lib.rs.html#3-7
    #[arg(short, long)]
    open: Option<String>,
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([400.0, 300.0])
            .with_title("Source Viewer"),
        ..Default::default()
    };

    eframe::run_native(
        "srcview",
        options,
        Box::new(move |cc| Ok(Box::new(SourceViewerApp::new(cc, args)))),
    )
}

/// One history entry: a page URL plus the fragment it was left with.
#[derive(Debug, Clone)]
struct Location {
    url: String,
    fragment: String,
}

fn location_text(url: &str, fragment: &str) -> String {
    if fragment.is_empty() {
        url.to_string()
    } else {
        format!("{}#{}", url, fragment)
    }
}

/// Map a page URL to the raw source file it presents: the page for
/// `src/<path><file>.html` shows the plain file `src/<path><file>`.
fn page_source_path(url: &str) -> Option<PathBuf> {
    url.strip_suffix(".html").map(PathBuf::from)
}

fn root_path_string(root: &Path) -> String {
    let mut path = root.display().to_string();
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}

/// Where a scroll request should land once the row height is known.
enum PendingScroll {
    Line(usize),
    Offset(f32),
}

struct SourceViewerApp {
    // Index and sidebar tree
    index: Option<SourceIndex>,
    tree: Option<SidebarTree>,
    force_tree_state: bool,
    focus_selected: bool,
    root_path: String,
    // Current page
    current_url: String,
    fragment: String,
    lines: Vec<String>,
    // Line selection
    selection: SelectionState,
    highlight: Option<HighlightRange>,
    // Sidebar visibility
    sidebar: SidebarToggle,
    // Navigation history
    history_back: Vec<Location>,
    history_forward: Vec<Location>,
    location_edit: String,
    // Content viewport
    pending_scroll: Option<PendingScroll>,
    content_scroll: f32,
    error_message: Option<String>,
    demo: bool,
}

impl SourceViewerApp {
    fn new(cc: &eframe::CreationContext<'_>, args: Args) -> Self {
        let pref = cc.storage.and_then(|s| s.get_string(SIDEBAR_PREF_KEY));
        let sidebar = SidebarToggle::from_pref(pref.as_deref());

        let mut app = Self {
            index: None,
            tree: None,
            force_tree_state: false,
            focus_selected: false,
            root_path: String::new(),
            current_url: String::new(),
            fragment: String::new(),
            lines: Vec::new(),
            selection: SelectionState::default(),
            highlight: None,
            sidebar,
            history_back: Vec::new(),
            history_forward: Vec::new(),
            location_edit: String::new(),
            pending_scroll: None,
            content_scroll: 0.0,
            error_message: None,
            demo: args.root.is_none(),
        };

        if let Some(root) = &args.root {
            app.root_path = root_path_string(root);
            let index_path = args.index.unwrap_or_else(|| root.join("index.json"));
            app.load_index(&index_path);
        } else {
            log::info!("no root directory given, loading the built-in demo tree");
            match SourceIndex::parse(SAMPLE_INDEX) {
                Ok(index) => app.index = Some(index),
                Err(e) => {
                    app.error_message = Some(format!("Failed to parse built-in index: {}", e));
                    log::error!("Failed to parse built-in index: {}", e);
                }
            }
        }

        let open = args
            .open
            .or_else(|| app.demo.then(|| DEMO_START_PAGE.to_string()));
        match open {
            Some(page) => {
                let target = format!("{}{}", app.root_path, page);
                app.open_location(&target);
            }
            None => app.rebuild_tree(),
        }

        app
    }

    fn load_index(&mut self, path: &Path) {
        match fs::read_to_string(path) {
            Ok(json) => match SourceIndex::parse(&json) {
                Ok(index) => {
                    log::info!("loaded index with {} roots from {:?}", index.roots.len(), path);
                    self.index = Some(index);
                    self.error_message = None;
                }
                Err(e) => {
                    self.error_message =
                        Some(format!("Failed to parse index {}: {}", path.display(), e));
                    log::error!("Failed to parse index {:?}: {}", path, e);
                }
            },
            Err(e) => {
                let error_msg = match e.kind() {
                    std::io::ErrorKind::NotFound => {
                        format!("Index not found: {}", path.display())
                    }
                    std::io::ErrorKind::PermissionDenied => {
                        format!("Permission denied: {}", path.display())
                    }
                    _ => format!("Failed to read index: {}", e),
                };
                self.error_message = Some(error_msg);
                log::error!("Failed to read index {:?}: {}", path, e);
            }
        }
    }

    /// Load the page a location names and run the fragment pass against it.
    /// Does not touch history; callers decide whether an entry is recorded.
    fn open_location(&mut self, location: &str) {
        let (page, fragment) = split_location(location);
        if page != self.current_url {
            self.current_url = page.to_string();
            self.load_page_content();
            // A fresh page starts with a clean selection; in-page fragment
            // navigation keeps the pending anchor alive.
            self.selection = SelectionState::default();
            self.highlight = None;
            self.rebuild_tree();
        }
        self.fragment = fragment.to_string();
        let effects = self.selection.reduce(
            SelectionEvent::FragmentChanged {
                fragment: fragment.to_string(),
            },
            self.lines.len(),
        );
        self.apply_selection_effects(effects);
        self.location_edit = self.display_location();
    }

    fn load_page_content(&mut self) {
        self.lines = Vec::new();
        if self.current_url.is_empty() {
            return;
        }

        if self.demo {
            match SAMPLE_PAGES.iter().find(|(url, _)| *url == self.current_url) {
                Some((_, text)) => {
                    self.lines = text.lines().map(str::to_string).collect();
                    self.error_message = None;
                }
                None => {
                    self.error_message = Some(format!("No such page: {}", self.current_url));
                    log::error!("demo page not found: {}", self.current_url);
                }
            }
            return;
        }

        let Some(path) = page_source_path(&self.current_url) else {
            self.error_message = Some(format!("Not a source page: {}", self.current_url));
            log::error!("cannot map page to a source file: {}", self.current_url);
            return;
        };

        // Read as bytes to handle invalid UTF-8 gracefully
        match fs::read(&path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                if content.contains('\u{FFFD}') {
                    self.error_message = Some(
                        "Warning: file contains invalid UTF-8 characters (replaced with \u{FFFD})"
                            .to_string(),
                    );
                    log::warn!("File {:?} contains invalid UTF-8", path);
                } else {
                    self.error_message = None;
                }
                self.lines = content.lines().map(str::to_string).collect();
            }
            Err(e) => {
                let error_msg = match e.kind() {
                    std::io::ErrorKind::NotFound => {
                        format!("File not found: {}", path.display())
                    }
                    std::io::ErrorKind::PermissionDenied => {
                        format!("Permission denied: {}", path.display())
                    }
                    _ => format!("Failed to load file: {}", e),
                };
                self.error_message = Some(error_msg);
                log::error!("Failed to load file {:?}: {}", path, e);
            }
        }
    }

    fn rebuild_tree(&mut self) {
        let Some(index) = &self.index else {
            self.tree = None;
            return;
        };
        let tree = tree::build_tree(index, &self.root_path, &self.current_url);
        self.focus_selected = tree.has_selection;
        self.force_tree_state = true;
        self.tree = Some(tree);
    }

    fn current_location(&self) -> Location {
        Location {
            url: self.current_url.clone(),
            fragment: self.fragment.clone(),
        }
    }

    fn display_location(&self) -> String {
        location_text(&self.current_url, &self.fragment)
    }

    /// Navigate to a file link target, recording a history entry.
    fn navigate_to(&mut self, href: &str) {
        if !self.current_url.is_empty() {
            self.history_back.push(self.current_location());
        }
        self.history_forward.clear();
        log::info!("navigating to {}", href);
        self.open_location(href);
    }

    /// Navigate back in history
    fn navigate_back(&mut self) {
        if let Some(prev) = self.history_back.pop() {
            self.history_forward.push(self.current_location());
            log::debug!("navigating back to {}", prev.url);
            self.open_location(&location_text(&prev.url, &prev.fragment));
        }
    }

    /// Navigate forward in history
    fn navigate_forward(&mut self) {
        if let Some(next) = self.history_forward.pop() {
            self.history_back.push(self.current_location());
            log::debug!("navigating forward to {}", next.url);
            self.open_location(&location_text(&next.url, &next.fragment));
        }
    }

    fn can_go_back(&self) -> bool {
        !self.history_back.is_empty()
    }

    fn can_go_forward(&self) -> bool {
        !self.history_forward.is_empty()
    }

    /// Committed edit of the location field. An unchanged page part is a
    /// fragment-change navigation; anything else is a full navigation.
    fn commit_location_edit(&mut self) {
        let entered = self.location_edit.trim().to_string();
        if entered.is_empty() {
            self.location_edit = self.display_location();
            return;
        }
        let (page, fragment) = split_location(&entered);
        if page == self.current_url {
            self.fragment = fragment.to_string();
            let effects = self.selection.reduce(
                SelectionEvent::FragmentChanged {
                    fragment: fragment.to_string(),
                },
                self.lines.len(),
            );
            self.apply_selection_effects(effects);
            self.location_edit = self.display_location();
        } else {
            self.navigate_to(&entered);
        }
    }

    fn open_index_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON index", &["json"])
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            // The site root is the directory holding the index.
            if let Some(parent) = path.parent() {
                self.root_path = root_path_string(parent);
            }
            self.demo = false;
            self.current_url.clear();
            self.fragment.clear();
            self.lines.clear();
            self.selection = SelectionState::default();
            self.highlight = None;
            self.history_back.clear();
            self.history_forward.clear();
            self.location_edit.clear();
            self.load_index(&path);
            self.rebuild_tree();
        }
    }

    fn apply_selection_effects(&mut self, effects: Vec<SelectionEffect>) {
        for effect in effects {
            match effect {
                SelectionEffect::ReplaceFragment(fragment) => {
                    self.fragment = fragment;
                    self.location_edit = self.display_location();
                }
                SelectionEffect::SetHighlight(range) => self.highlight = Some(range),
                SelectionEffect::ScrollToLine(line) => {
                    self.pending_scroll = Some(PendingScroll::Line(line));
                }
                SelectionEffect::RestoreScroll => {
                    self.pending_scroll = Some(PendingScroll::Offset(self.content_scroll));
                }
            }
        }
    }

    fn apply_toggle_effects(&mut self, effects: Vec<ToggleEffect>) {
        for effect in effects {
            match effect {
                ToggleEffect::PersistPreference(value) => {
                    // Held in app state; the storage string goes out on the
                    // host's save cycle.
                    log::debug!("sidebar preference -> {}", value);
                }
                ToggleEffect::RestoreScroll(offset) => {
                    self.pending_scroll = Some(PendingScroll::Offset(offset));
                }
            }
        }
    }

    fn window_title(&self) -> String {
        match self.current_url.rsplit('/').next() {
            Some(page) if !page.is_empty() => {
                format!("{} - Source Viewer", page.trim_end_matches(".html"))
            }
            _ => "Source Viewer".to_string(),
        }
    }
}

impl eframe::App for SourceViewerApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string(SIDEBAR_PREF_KEY, self.sidebar.shown.to_string());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.window_title()));

        let narrow = ctx.screen_rect().width() < NARROW_BREAKPOINT;
        if !narrow {
            self.sidebar.release_freeze();
        }

        // Keyboard shortcuts
        let mut open_dialog = false;
        let mut toggle_sidebar = false;
        let mut go_back = false;
        let mut go_forward = false;
        let mut quit_app = false;

        ctx.input(|i| {
            // Ctrl+O: Open index
            if i.modifiers.ctrl && i.key_pressed(egui::Key::O) {
                open_dialog = true;
            }
            // Ctrl+B: Toggle sidebar
            if i.modifiers.ctrl && i.key_pressed(egui::Key::B) {
                toggle_sidebar = true;
            }
            // Alt+Left: Go back in history
            if i.modifiers.alt && i.key_pressed(egui::Key::ArrowLeft) {
                go_back = true;
            }
            // Alt+Right: Go forward in history
            if i.modifiers.alt && i.key_pressed(egui::Key::ArrowRight) {
                go_forward = true;
            }
            // Ctrl+Q: Quit
            if i.modifiers.ctrl && i.key_pressed(egui::Key::Q) {
                quit_app = true;
            }
        });

        if quit_app {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        // Menu bar
        let mut commit_location = false;
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                if ui
                    .button(self.sidebar.glyph())
                    .on_hover_text("Toggle the file sidebar")
                    .clicked()
                {
                    toggle_sidebar = true;
                }

                ui.menu_button("File", |ui| {
                    if ui
                        .add(egui::Button::new("Open Index...").shortcut_text("Ctrl+O"))
                        .clicked()
                    {
                        open_dialog = true;
                        ui.close();
                    }

                    ui.separator();

                    if ui
                        .add(egui::Button::new("Quit").shortcut_text("Ctrl+Q"))
                        .clicked()
                    {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close();
                    }
                });

                ui.menu_button("Navigate", |ui| {
                    let can_back = self.can_go_back();
                    if ui
                        .add_enabled(can_back, egui::Button::new("← Back").shortcut_text("Alt+←"))
                        .clicked()
                    {
                        go_back = true;
                        ui.close();
                    }

                    let can_forward = self.can_go_forward();
                    if ui
                        .add_enabled(
                            can_forward,
                            egui::Button::new("→ Forward").shortcut_text("Alt+→"),
                        )
                        .clicked()
                    {
                        go_forward = true;
                        ui.close();
                    }
                });

                // Editable location on the right
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.location_edit)
                            .font(egui::TextStyle::Monospace)
                            .desired_width(360.0)
                            .hint_text("src/...#from-to"),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        commit_location = true;
                    }
                });
            });
        });

        if open_dialog {
            self.open_index_dialog();
        }
        if toggle_sidebar {
            let effects = self.sidebar.activate(narrow, self.content_scroll);
            self.apply_toggle_effects(effects);
        }
        if commit_location {
            self.commit_location_edit();
        }
        if go_back {
            self.navigate_back();
        }
        if go_forward {
            self.navigate_forward();
        }

        // Sidebar: docked panel on wide windows, overlay on narrow ones
        let mut clicked_href: Option<String> = None;
        if self.sidebar.shown {
            if let Some(tree) = &self.tree {
                let force = self.force_tree_state;
                let mut focus = self.focus_selected;
                let panel_contents = |ui: &mut egui::Ui| {
                    ui.add_space(4.0);
                    ui.heading("Files");
                    ui.separator();
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        for (i, root) in tree.roots.iter().enumerate() {
                            show_dir(ui, i, root, force, &mut focus, &mut clicked_href);
                        }
                    });
                };

                if narrow {
                    egui::Window::new("Files")
                        .id(egui::Id::new("source_sidebar_overlay"))
                        .title_bar(false)
                        .resizable(false)
                        .anchor(egui::Align2::LEFT_TOP, [0.0, 28.0])
                        .fixed_size([240.0, ctx.screen_rect().height() - 40.0])
                        .show(ctx, panel_contents);
                } else {
                    egui::SidePanel::left("source_sidebar")
                        .resizable(true)
                        .default_width(220.0)
                        .min_width(140.0)
                        .max_width(400.0)
                        .show(ctx, panel_contents);
                }

                self.focus_selected = focus;
                self.force_tree_state = false;
            }
        }

        if let Some(href) = clicked_href {
            // Collapse and persist before the navigation proceeds.
            let effects = self.sidebar.collapse_for_navigation(narrow);
            self.apply_toggle_effects(effects);
            self.navigate_to(&href);
        }

        // Main content panel
        let mut clear_error = false;
        let mut clicked_line: Option<(usize, bool)> = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(error) = &self.error_message {
                let error_text = error.clone();
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new("⚠").color(egui::Color32::from_rgb(255, 200, 100)),
                    );
                    ui.label(
                        egui::RichText::new(&error_text)
                            .color(egui::Color32::from_rgb(255, 200, 100)),
                    );
                    if ui.small_button("✕").clicked() {
                        clear_error = true;
                    }
                });
                ui.separator();
            }

            if self.lines.is_empty() {
                if self.current_url.is_empty() {
                    ui.add_space(16.0);
                    ui.label(
                        "Open a generated source tree (srcview <root>) or pick a file from the sidebar.",
                    );
                }
                return;
            }

            let row_height = ui.text_style_height(&egui::TextStyle::Monospace);
            let row_spacing = ui.spacing().item_spacing.y;
            let gutter_width = self.lines.len().to_string().len().max(4);
            let highlight_color = ui.visuals().selection.bg_fill;

            let mut scroll_area = egui::ScrollArea::both().auto_shrink([false, false]);
            if let Some(frozen) = self.sidebar.frozen_scroll() {
                // Overlay open on a narrow window: the content stays put.
                scroll_area = scroll_area.vertical_scroll_offset(frozen);
            } else if let Some(pending) = self.pending_scroll.take() {
                let offset = match pending {
                    PendingScroll::Line(line) => {
                        line.saturating_sub(1) as f32 * (row_height + row_spacing)
                    }
                    PendingScroll::Offset(offset) => offset,
                };
                scroll_area = scroll_area.vertical_scroll_offset(offset.max(0.0));
            }

            let highlight = self.highlight;
            let lines = &self.lines;
            let output = scroll_area.show_rows(ui, row_height, lines.len(), |ui, row_range| {
                for i in row_range {
                    let line_no = i + 1;
                    let highlighted = highlight.is_some_and(|h| h.contains(line_no));
                    ui.horizontal(|ui| {
                        let mut number = egui::RichText::new(format!(
                            "{:>width$}",
                            line_no,
                            width = gutter_width
                        ))
                        .monospace();
                        if highlighted {
                            number = number.background_color(highlight_color);
                        } else {
                            number = number.color(ui.visuals().weak_text_color());
                        }
                        let response = ui.add(
                            egui::Label::new(number)
                                .sense(egui::Sense::click())
                                .wrap_mode(egui::TextWrapMode::Extend),
                        );
                        if response.clicked() {
                            let shift = ui.input(|input| input.modifiers.shift);
                            clicked_line = Some((line_no, shift));
                        }

                        let mut text = egui::RichText::new(&lines[i]).monospace();
                        if highlighted {
                            text = text.background_color(highlight_color);
                        }
                        ui.add(egui::Label::new(text).wrap_mode(egui::TextWrapMode::Extend));
                    });
                }
            });
            self.content_scroll = output.state.offset.y;
        });
        if clear_error {
            self.error_message = None;
        }

        if let Some((line, shift)) = clicked_line {
            let effects = self
                .selection
                .reduce(SelectionEvent::LineClicked { line, shift }, self.lines.len());
            self.apply_selection_effects(effects);
        }
    }
}

fn show_dir(
    ui: &mut egui::Ui,
    salt: usize,
    dir: &TreeDir,
    force: bool,
    focus: &mut bool,
    clicked: &mut Option<String>,
) {
    // Forcing the computed open states once makes a rebuild behave like a
    // fresh page; afterwards the widget state belongs to the user.
    let forced = if force { Some(dir.open) } else { None };
    egui::CollapsingHeader::new(&dir.name)
        .id_salt((salt, &dir.name))
        .open(forced)
        .show(ui, |ui| {
            for (i, child) in dir.dirs.iter().enumerate() {
                show_dir(ui, i, child, force, focus, clicked);
            }
            for file in &dir.files {
                let response = ui.selectable_label(file.selected, &file.name);
                if file.selected && *focus {
                    response.request_focus();
                    response.scroll_to_me(Some(egui::Align::Center));
                    *focus = false;
                }
                if response.clicked() {
                    *clicked = Some(file.href.clone());
                }
            }
        });
}

const DEMO_START_PAGE: &str = "src/demo/lib.rs.html";

const SAMPLE_INDEX: &str = r#"{
    "demo": {
        "dirs": [
            { "name": "widgets", "dirs": [], "files": ["button.rs", "list.rs"] }
        ],
        "files": ["lib.rs", "main.rs"]
    }
}"#;

const SAMPLE_PAGES: &[(&str, &str)] = &[
    (
        "src/demo/lib.rs.html",
        r#"//! Demo crate shipped with the viewer.
//!
//! Click a line number to select it, shift-click another one to select the
//! whole range, and watch the location field track the selection.

pub mod widgets;

pub use widgets::{Button, List};

/// A minimal application shell.
pub struct App {
    pub title: String,
    pub buttons: Vec<Button>,
}

impl App {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }
}
"#,
    ),
    (
        "src/demo/main.rs.html",
        r#"use demo::{App, Button};

fn main() {
    let app = App::new("demo")
        .with_button(Button::new("Ok"))
        .with_button(Button::new("Cancel"));

    for button in &app.buttons {
        println!("button: {}", button.label);
    }
}
"#,
    ),
    (
        "src/demo/widgets/button.rs.html",
        r#"/// A push button.
#[derive(Debug, Clone)]
pub struct Button {
    pub label: String,
    pub enabled: bool,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn press(&self) -> bool {
        self.enabled
    }
}
"#,
    ),
    (
        "src/demo/widgets/list.rs.html",
        r#"/// A flat list of selectable rows.
#[derive(Debug, Default)]
pub struct List {
    pub rows: Vec<String>,
    pub selected: Option<usize>,
}

impl List {
    pub fn push(&mut self, row: impl Into<String>) {
        self.rows.push(row.into());
    }

    pub fn select(&mut self, index: usize) {
        if index < self.rows.len() {
            self.selected = Some(index);
        }
    }

    pub fn selected_row(&self) -> Option<&str> {
        self.selected.and_then(|i| self.rows.get(i)).map(String::as_str)
    }
}
"#,
    ),
];
