pub(crate) mod cell_edit;
pub(crate) mod cell_view;
mod config;
pub(crate) mod edit_form;
pub(crate) mod filter_widgets;
mod state;
mod tool_column;

pub use config::TableViewConfig;

use egui::{
    Button, CornerRadius, Id, Label, Modal, PointerButton, Response, RichText, ScrollArea, Sense,
    Ui, Vec2, Widget,
};
use egui_extras::{Column, TableBody};
use grid_core::backend::{OneShotFlags, TableBackend, VisualRowIdx};
use grid_core::dispatch::REM;
use grid_core::{CellCoord, ColumnUid, RowUid};
use log::trace;
use tap::Tap;

use crate::frontend::TableFrontend;

pub struct TableView {
    state: state::State,
    config: TableViewConfig,
}

impl Default for TableView {
    fn default() -> Self {
        Self::new()
    }
}

/// Header interactions collected while the table borrows the backend.
#[derive(Default)]
struct HeaderActions {
    sort: Option<String>,
    toggle_filter: Option<ColumnUid>,
}

impl TableView {
    pub fn new() -> Self {
        TableView {
            state: state::State::default(),
            config: TableViewConfig::default(),
        }
    }

    pub fn config(&self) -> &TableViewConfig {
        &self.config
    }

    pub fn show<T: TableBackend + TableFrontend>(
        &mut self,
        table: &mut T,
        ui: &mut Ui,
        id: Id,
    ) -> Response {
        table.poll();
        let flags = *table.one_shot_flags_internal();
        if flags.columns_reset {
            trace!("columns reset, dropping view state");
            self.state.reset();
        } else if flags.row_set_updated {
            self.state.row_heights.clear();
        }

        let freeze = ui.ctx().screen_rect().width() >= self.config.unfreeze_below_width;
        let columns = table.used_columns().collect::<Vec<_>>().tap_mut(|columns| {
            if !freeze {
                columns.sort();
            }
        });
        let show_tools = self.config.show_tool_column && !table.persistent_flags().is_read_only;
        let frozen_bg = self.config.frozen_background;
        let visual = ui.style().visuals.clone();

        let mut actions = HeaderActions::default();
        let mut resp_total = None::<Response>;

        ScrollArea::horizontal()
            .id_salt(id.with("h_scroll"))
            .drag_to_scroll(false)
            .show(ui, |ui| {
                let mut builder = egui_extras::TableBuilder::new(ui).id_salt(id);
                if show_tools {
                    builder = builder.column(Column::exact(3.5 * REM));
                }
                for col_uid in &columns {
                    builder = builder.column(table.column_render_config(*col_uid));
                }
                builder
                    .striped(true)
                    .resizable(true)
                    .max_scroll_height(f32::MAX)
                    .header(1.5 * REM, |mut h| {
                        if show_tools {
                            h.col(|ui| {
                                if table.persistent_flags().cells_loading {
                                    ui.spinner();
                                }
                            });
                        }
                        for col_uid in &columns {
                            let Some(column) = table.column_info(*col_uid) else {
                                h.col(|_| {});
                                continue;
                            };
                            let is_frozen = freeze && column.frozen;
                            let sort_marker = match table.sort() {
                                Some(sort) if sort.field == column.field => {
                                    if sort.ascending { " ⏶" } else { " ⏷" }
                                }
                                _ => "",
                            };
                            let filter_active = table.filters().state().is_active(&column.field);
                            let (_, resp) = h.col(|ui| {
                                if is_frozen {
                                    ui.painter().rect_filled(
                                        ui.max_rect(),
                                        CornerRadius::ZERO,
                                        frozen_bg,
                                    );
                                }
                                ui.horizontal(|ui| {
                                    let label = Label::new(
                                        RichText::new(format!("{}{sort_marker}", column.header))
                                            .strong(),
                                    )
                                    .selectable(false)
                                    .truncate()
                                    .sense(Sense::click())
                                    .ui(ui);
                                    if label.hovered() {
                                        ui.painter().rect_filled(
                                            label.rect,
                                            CornerRadius::ZERO,
                                            visual.selection.bg_fill.gamma_multiply(0.2),
                                        );
                                    }
                                    if label.clicked_by(PointerButton::Primary) {
                                        actions.sort = Some(column.field.clone());
                                    }
                                    let icon_color = if filter_active {
                                        visual.selection.stroke.color
                                    } else {
                                        visual.weak_text_color()
                                    };
                                    let filter_button = Button::new(
                                        RichText::new("🔍").color(icon_color),
                                    )
                                    .frame(false)
                                    .small();
                                    if ui
                                        .add(filter_button)
                                        .on_hover_text("Filter")
                                        .clicked()
                                    {
                                        actions.toggle_filter = Some(*col_uid);
                                    }
                                });
                            });
                            resp.on_hover_text(column.field.as_str());
                        }

                        // Account for header response to calculate total response.
                        resp_total = Some(h.response());
                    })
                    .body(|body| {
                        resp_total = self.show_body(
                            table,
                            body,
                            &columns,
                            show_tools,
                            freeze,
                            id,
                            resp_total.take(),
                        );
                    });
            });

        if table.row_count() == 0 {
            let text = if table.persistent_flags().cells_loading {
                "Loading…"
            } else {
                "No records found."
            };
            ui.weak(text);
        }

        if let Some(field) = actions.sort {
            table.cycle_sort(&field);
        }
        if let Some(col_uid) = actions.toggle_filter {
            self.state.open_filter = match self.state.open_filter {
                Some(open) if open == col_uid => None,
                _ => Some(col_uid),
            };
        }
        self.show_filter_window(table, ui, id);
        self.show_delete_confirm(table, ui, id);

        table.one_shot_flags_archive();
        *table.one_shot_flags_mut() = OneShotFlags::default();

        resp_total.unwrap_or_else(|| ui.allocate_response(Vec2::ZERO, Sense::hover()))
    }

    #[allow(clippy::too_many_arguments)]
    fn show_body<T: TableBackend + TableFrontend>(
        &mut self,
        table: &mut T,
        body: TableBody<'_>,
        columns: &[ColumnUid],
        show_tools: bool,
        freeze: bool,
        id: Id,
        mut resp_total: Option<Response>,
    ) -> Option<Response> {
        let minimum_row_height = self.config.minimum_row_height;
        let frozen_bg = self.config.frozen_background;
        let row_heights = core::mem::take(&mut self.state.row_heights);
        let mut row_heights_updates = Vec::new();
        let mut delete_request = None::<RowUid>;

        let heights = (0..table.row_count())
            .map(|idx| {
                table
                    .row_uid(VisualRowIdx(idx))
                    .and_then(|row_uid| row_heights.get(&row_uid).copied())
                    .unwrap_or(minimum_row_height)
            })
            .collect::<Vec<_>>();
        let row_count = heights.len();

        let render_fn = |mut row: egui_extras::TableRow| {
            let Some(row_uid) = table.row_uid(VisualRowIdx(row.index())) else {
                return;
            };
            let is_editing = table.row_edit() == Some(row_uid);
            row.set_selected(is_editing);

            let mut next_frame_row_height = minimum_row_height;
            if show_tools {
                let (rect, _) = row.col(|ui| {
                    if let Some(row_uid) = tool_column::tool_column_ui(ui, table, row_uid) {
                        delete_request = Some(row_uid);
                    }
                });
                next_frame_row_height = rect.height().max(next_frame_row_height);
            }
            for col_uid in columns {
                let is_frozen = freeze && table.column_info(*col_uid).is_some_and(|c| c.frozen);
                let coord = CellCoord {
                    row_uid,
                    col_uid: *col_uid,
                };
                let (rect, _resp) = row.col(|ui| {
                    if is_frozen {
                        ui.painter()
                            .rect_filled(ui.max_rect(), CornerRadius::ZERO, frozen_bg);
                    }
                    let cell_id = id.with((row_uid.0, col_uid.0));
                    if is_editing {
                        table.show_cell_editor(coord, ui, cell_id);
                    } else {
                        table.show_cell_view(coord, ui, cell_id);
                    }
                });
                next_frame_row_height = rect.height().max(next_frame_row_height);
            } // for col_uid in columns

            if let Some(prev_row_height) = row_heights.get(&row_uid) {
                if (next_frame_row_height - *prev_row_height).abs() > 0.1 {
                    row_heights_updates.push((row_uid, next_frame_row_height));
                }
            } else {
                row_heights_updates.push((row_uid, next_frame_row_height));
            }

            // Accumulate response
            if let Some(resp) = &mut resp_total {
                *resp = resp.union(row.response());
            } else {
                resp_total = Some(row.response());
            }
        };

        if self.config.use_heterogeneous_row_heights {
            body.heterogeneous_rows(heights.into_iter(), render_fn);
        } else {
            body.rows(minimum_row_height, row_count, render_fn);
        }

        self.state.row_heights = row_heights.tap_mut(|row_heights| {
            for (row_uid, next_frame_row_height) in row_heights_updates {
                row_heights.insert(row_uid, next_frame_row_height);
            }
        });
        if delete_request.is_some() {
            self.state.delete_confirm = delete_request;
        }

        resp_total
    }

    fn show_filter_window<T: TableBackend>(&mut self, table: &mut T, ui: &mut Ui, id: Id) {
        let Some(col_uid) = self.state.open_filter else {
            return;
        };
        let mut open = true;
        let mut output = None;
        if let Some(column) = table.column_info(col_uid) {
            egui::Window::new(format!("Filter: {}", column.header))
                .id(id.with(("filter", col_uid.0)))
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .show(ui.ctx(), |ui| {
                    output = Some(filter_widgets::filter_panel_ui(
                        column,
                        table.filters(),
                        &mut self.state.filter_drafts,
                        ui,
                        id.with(("filter_panel", col_uid.0)),
                    ));
                });
        } else {
            open = false;
        }
        if let Some(output) = output {
            for command in output.commands {
                table.handle_filter(command);
            }
            open &= !output.close;
        }
        if !open {
            self.state.open_filter = None;
        }
    }

    fn show_delete_confirm<T: TableBackend>(&mut self, table: &mut T, ui: &mut Ui, id: Id) {
        let Some(row_uid) = self.state.delete_confirm else {
            return;
        };
        let Some(record) = table.record(row_uid) else {
            self.state.delete_confirm = None;
            return;
        };
        let name = ["name", "title"]
            .into_iter()
            .map(|field| record.get_or_null(field).to_string())
            .find(|name| !name.is_empty())
            .unwrap_or_else(|| "this record".to_string());

        let mut confirmed = false;
        let mut cancelled = false;
        let modal = Modal::new(id.with("delete_confirm")).show(ui.ctx(), |ui| {
            ui.heading("Delete Row");
            ui.label(format!("Are you sure you want to delete {name}?"));
            ui.separator();
            ui.horizontal(|ui| {
                confirmed = ui.button("Yes").clicked();
                cancelled = ui.button("No").clicked();
            });
        });
        if confirmed {
            table.remove_row(row_uid);
        }
        if confirmed || cancelled || modal.should_close() {
            self.state.delete_confirm = None;
        }
    }
}
