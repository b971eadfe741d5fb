use std::collections::HashMap;

use egui_crud_grid::backends::remote::RemoteBackend;
use egui_crud_grid::backends::remote_ui::RemoteBackendUi;
use egui_crud_grid::grid_core::models::Entity;
use egui_crud_grid::grid_core::sync::RecordSyncController;
use egui_crud_grid::grid_core::transport::HttpTransport;
use egui_crud_grid::grid_core::ClientConfig;
use egui_crud_grid::table_view::TableViewConfig;
use egui_crud_grid::TableView;
use log::{error, warn};
use strum::IntoEnumIterator;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const CONFIG_KEY: &str = "table_view_config";

struct Tab {
    backend: RemoteBackend,
    toolbar: RemoteBackendUi,
    view: TableView,
}

struct SwapiApp {
    runtime: tokio::runtime::Runtime,
    client_config: ClientConfig,
    view_config: TableViewConfig,
    entity: Entity,
    tabs: HashMap<Entity, Tab>,
    error: Option<String>,
}

/// TOML file given as the first argument, then the environment, then the local default.
fn client_config() -> ClientConfig {
    if let Some(path) = std::env::args().nth(1) {
        match ClientConfig::from_file(&path) {
            Ok(config) => return config,
            Err(e) => error!("{e}"),
        }
    }
    ClientConfig::from_env().unwrap_or_else(|e| {
        warn!("{e}, using {DEFAULT_API_URL}");
        ClientConfig::new(DEFAULT_API_URL)
    })
}

impl SwapiApp {
    fn new(cc: &eframe::CreationContext<'_>, runtime: tokio::runtime::Runtime) -> Self {
        let view_config = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, CONFIG_KEY))
            .unwrap_or_default();
        SwapiApp {
            runtime,
            client_config: client_config(),
            view_config,
            entity: Entity::Starships,
            tabs: HashMap::new(),
            error: None,
        }
    }

    fn open_tab(&mut self, entity: Entity) {
        if self.tabs.contains_key(&entity) {
            return;
        }
        let transport = match HttpTransport::new(self.client_config.clone()) {
            Ok(transport) => transport,
            Err(e) => {
                self.error = Some(e.to_string());
                return;
            }
        };
        let sync = RecordSyncController::new(transport, self.client_config.clone());
        match RemoteBackend::new(entity.spec(), sync, self.runtime.handle().clone()) {
            Ok(backend) => {
                self.tabs.insert(
                    entity,
                    Tab {
                        backend,
                        toolbar: RemoteBackendUi::new(),
                        view: TableView::new().with_config(self.view_config.clone()),
                    },
                );
            }
            Err(e) => self.error = Some(format!("{entity}: {e}")),
        }
    }

    fn view_settings_ui(&mut self, ui: &mut egui::Ui) {
        let config = &mut self.view_config;
        let mut changed = false;
        changed |= ui
            .add(egui::Slider::new(&mut config.minimum_row_height, 16.0..=64.0).text("Row height"))
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut config.unfreeze_below_width, 0.0..=2000.0)
                    .text("Unfreeze below"),
            )
            .changed();
        changed |= ui
            .checkbox(&mut config.show_tool_column, "Edit buttons")
            .changed();
        if changed {
            for tab in self.tabs.values_mut() {
                *tab.view.config_mut() = self.view_config.clone();
            }
        }
    }
}

impl eframe::App for SwapiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.open_tab(self.entity);

        egui::TopBottomPanel::top("MenuBar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                for entity in Entity::iter() {
                    ui.selectable_value(&mut self.entity, entity, entity.to_string());
                }
                ui.separator();
                ui.menu_button("View", |ui| self.view_settings_ui(ui));
                egui::widgets::global_theme_preference_buttons(ui);
                ui.separator();
                ui.weak(self.client_config.base_url.as_str());
            })
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(e) = &self.error {
                ui.colored_label(egui::Color32::LIGHT_RED, e);
            }
            let Some(tab) = self.tabs.get_mut(&self.entity) else {
                return;
            };
            let id = ui.id().with(self.entity.to_string());
            tab.toolbar.show(&mut tab.backend, ui, id.with("toolbar"));
            ui.separator();
            tab.view.show(&mut tab.backend, ui, id.with("table"));
        });

        // Results arrive from the runtime threads, keep polling while any is outstanding.
        if self.tabs.values().any(|tab| tab.backend.is_loading()) {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, CONFIG_KEY, &self.view_config);
    }
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt::init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    eframe::run_native(
        "Star Wars Info",
        eframe::NativeOptions {
            centered: true,
            ..Default::default()
        },
        Box::new(|cc| Ok(Box::new(SwapiApp::new(cc, runtime)))),
    )
}
