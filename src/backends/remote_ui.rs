use egui::{Color32, Id, Modal, RichText, TextEdit, Ui, Widget};
use grid_core::backend::TableBackend;
use grid_core::dispatch::REM;
use grid_core::{FilterCommand, Record};

use crate::table_view::edit_form::record_form_ui;
use crate::util::export_csv;

/// Toolbar above the table plus the dialogs it opens: add form, import suggestion,
/// import report.
#[derive(Default)]
pub struct RemoteBackendUi {
    search: String,
    add_draft: Option<Record>,
    import_prompt_dismissed: bool,
    import_report_open: bool,
}

impl RemoteBackendUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, table: &mut impl TableBackend, ui: &mut Ui, id: Id) {
        let flags = *table.one_shot_flags();
        if flags.columns_reset {
            self.search = table.filters().state().global_text().to_string();
            self.add_draft = None;
            self.import_prompt_dismissed = false;
        }
        if flags.import_finished && table.last_import().is_some() {
            self.import_report_open = true;
        }

        let read_only = table.persistent_flags().is_read_only;
        let loading = table.persistent_flags().cells_loading;
        let importing = table.persistent_flags().import_running;

        ui.horizontal_wrapped(|ui| {
            if ui
                .add_enabled(!read_only, egui::Button::new("➕ Add"))
                .clicked()
            {
                self.add_draft = Some(Record::new());
            }
            if ui
                .add_enabled(!loading, egui::Button::new("⟳ Reload"))
                .clicked()
            {
                table.reload();
            }
            if ui
                .add_enabled(!importing && !read_only, egui::Button::new("⬇ Import"))
                .on_hover_text("Import every entity from the Star Wars API")
                .clicked()
            {
                table.trigger_import();
            }
            ui.separator();

            let search = TextEdit::singleline(&mut self.search)
                .hint_text("Keyword Search")
                .desired_width(14.0 * REM)
                .ui(ui);
            if search.changed() {
                table.handle_filter(FilterCommand::SetGlobal(self.search.clone()));
            }
            if ui
                .button("Clear")
                .on_hover_text("Clear every filter and the keyword search")
                .clicked()
            {
                self.search.clear();
                table.handle_filter(FilterCommand::ClearAll);
            }
            ui.separator();

            if ui.button("Export CSV").clicked() {
                export_csv(&*table);
            }
            ui.separator();

            if importing {
                ui.spinner();
                ui.label("Importing…");
            } else if loading {
                ui.spinner();
            }
            ui.label(format!("{} record(s)", table.row_count()));
            if let Some(error) = table.last_error() {
                ui.label(RichText::new(error).color(Color32::LIGHT_RED));
            }
        });

        self.show_add_form(table, ui, id);
        self.show_import_prompt(table, ui, id);
        self.show_import_report(&*table, ui, id);
    }

    fn show_add_form(&mut self, table: &mut impl TableBackend, ui: &mut Ui, id: Id) {
        let Some(draft) = self.add_draft.as_mut() else {
            return;
        };
        let mut save = false;
        let mut cancel = false;
        let modal = Modal::new(id.with("add_form")).show(ui.ctx(), |ui| {
            ui.heading("New Record");
            let columns = table
                .available_columns()
                .filter_map(|col_uid| table.column_info(col_uid));
            record_form_ui(columns, draft, ui, id.with("add_form_fields"));
            ui.separator();
            ui.horizontal(|ui| {
                save = ui.button("Save").clicked();
                cancel = ui.button("Cancel").clicked();
            });
        });
        if save {
            if let Some(record) = self.add_draft.take() {
                table.save_record(record);
            }
        } else if cancel || modal.should_close() {
            self.add_draft = None;
        }
    }

    fn show_import_prompt(&mut self, table: &mut impl TableBackend, ui: &mut Ui, id: Id) {
        let flags = table.persistent_flags();
        if !flags.is_import_recommended
            || flags.import_running
            || flags.is_read_only
            || self.import_prompt_dismissed
        {
            return;
        }
        let mut import = false;
        let mut dismiss = false;
        let modal = Modal::new(id.with("import_prompt")).show(ui.ctx(), |ui| {
            ui.heading("Import Data");
            ui.label(
                "No database records were found. \
                 Would you like to import data from the Star Wars API now?",
            );
            ui.separator();
            ui.horizontal(|ui| {
                import = ui.button("Yes").clicked();
                dismiss = ui.button("No").clicked();
            });
        });
        if import {
            table.trigger_import();
        }
        if import || dismiss || modal.should_close() {
            self.import_prompt_dismissed = true;
        }
    }

    fn show_import_report(&mut self, table: &impl TableBackend, ui: &mut Ui, id: Id) {
        if !self.import_report_open {
            return;
        }
        let Some(report) = table.last_import() else {
            self.import_report_open = false;
            return;
        };
        let mut close = false;
        let modal = Modal::new(id.with("import_report")).show(ui.ctx(), |ui| {
            ui.heading("Import Data Complete");
            ui.label(format!("Status: {}", report.status));
            if !report.message.is_empty() {
                ui.label(report.message.as_str());
            }
            egui::Grid::new(id.with("import_counts"))
                .num_columns(2)
                .show(ui, |ui| {
                    for (entity, count) in report.counts() {
                        ui.label(entity);
                        ui.label(count.to_string());
                        ui.end_row();
                    }
                });
            ui.separator();
            close = ui.button("OK").clicked();
        });
        if close || modal.should_close() {
            self.import_report_open = false;
        }
    }
}
