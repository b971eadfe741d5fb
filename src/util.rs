use std::io::Write;

use grid_core::backend::{TableBackend, VisualRowIdx};
use grid_core::Value;
use log::{debug, error};

/// Visible rows in view order, cells formatted the way the table shows them.
pub fn write_csv<W: Write>(table: &impl TableBackend, wtr: W) -> csv::Result<()> {
    let columns = table
        .used_columns()
        .filter_map(|col_uid| table.column_info(col_uid).map(|info| (col_uid, info)))
        .collect::<Vec<_>>();
    let mut wtr = csv::Writer::from_writer(wtr);
    wtr.write_record(columns.iter().map(|(_, info)| info.header.as_str()))?;
    for idx in 0..table.row_count() {
        let Some(row_uid) = table.row_uid(VisualRowIdx(idx)) else {
            continue;
        };
        let record = columns.iter().map(|(col_uid, info)| {
            let value = table.get((row_uid, *col_uid).into()).unwrap_or(&Value::Null);
            info.formatter.format(value)
        });
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Ask for a file and write the visible rows into it.
pub fn export_csv(table: &impl TableBackend) {
    let Some(path) = rfd::FileDialog::new()
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };
    let file = match std::fs::File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            error!("export to {}: {e}", path.display());
            return;
        }
    };
    match write_csv(table, file) {
        Ok(()) => debug!("exported {} row(s) to {}", table.row_count(), path.display()),
        Err(e) => error!("export to {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::backend::{OneShotFlags, PersistentFlags};
    use grid_core::dispatch::ColumnWidgets;
    use grid_core::sort::SortBy;
    use grid_core::{
        CellCoord, ColumnUid, FieldSpec, FilterCommand, FilterController, GridModel, ModelSpec,
        Record, RowUid,
    };
    use pretty_assertions::assert_eq;

    /// GridModel without a service behind it.
    struct Local {
        grid: GridModel,
        flags: PersistentFlags,
        one_shot: OneShotFlags,
    }

    impl TableBackend for Local {
        fn clear(&mut self) {
            self.grid.clear();
        }
        fn persistent_flags(&self) -> &PersistentFlags {
            &self.flags
        }
        fn one_shot_flags(&self) -> &OneShotFlags {
            &self.one_shot
        }
        fn one_shot_flags_internal(&self) -> &OneShotFlags {
            &self.one_shot
        }
        fn one_shot_flags_archive(&mut self) {}
        fn one_shot_flags_mut(&mut self) -> &mut OneShotFlags {
            &mut self.one_shot
        }
        fn available_columns(&self) -> impl Iterator<Item = ColumnUid> {
            self.grid.columns().iter().map(|(uid, _)| uid)
        }
        fn used_columns(&self) -> impl Iterator<Item = ColumnUid> {
            self.grid.columns().ordered(true).into_iter()
        }
        fn column_info(&self, col_uid: ColumnUid) -> Option<&ColumnWidgets> {
            self.grid.columns().get(col_uid)
        }
        fn row_count(&self) -> usize {
            self.grid.visible_rows().len()
        }
        fn row_uid(&self, row_idx: VisualRowIdx) -> Option<RowUid> {
            self.grid.visible_rows().get(row_idx.0).copied()
        }
        fn get(&self, coord: CellCoord) -> Option<&Value> {
            self.grid.cell(coord)
        }
        fn record(&self, row_uid: RowUid) -> Option<&Record> {
            self.grid.record(row_uid)
        }
        fn save_record(&mut self, record: Record) {
            self.grid.apply_saved(record);
        }
        fn remove_row(&mut self, _row_uid: RowUid) {}
        fn filters(&self) -> &FilterController {
            self.grid.filters()
        }
        fn handle_filter(&mut self, command: FilterCommand) {
            self.grid.handle_filter(command);
        }
        fn sort(&self) -> Option<&SortBy> {
            self.grid.sort()
        }
        fn cycle_sort(&mut self, field: &str) {
            self.grid.cycle_sort(field);
        }
    }

    fn table() -> Local {
        let mut grid = GridModel::new(ModelSpec::new([
            ("starship_id", FieldSpec::id().data_key().read_only()),
            ("name", FieldSpec::text().frozen()),
            ("cost_in_credits", FieldSpec::number()),
        ]))
        .unwrap();
        grid.replace_records(vec![
            Record::from_iter([
                ("starship_id", Value::from(2)),
                ("name", Value::from("X-wing")),
                ("cost_in_credits", Value::from(149999)),
            ]),
            Record::from_iter([
                ("starship_id", Value::from(3)),
                ("name", Value::from("A-wing")),
            ]),
        ]);
        Local {
            grid,
            flags: PersistentFlags::default(),
            one_shot: OneShotFlags::default(),
        }
    }

    #[test]
    fn csv_uses_view_order_and_formatting() {
        let mut out = Vec::new();
        write_csv(&table(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Name,Starship Id,Cost In Credits\nA-wing,3,\nX-wing,2,\"149,999\"\n"
        );
    }

    #[test]
    fn csv_skips_filtered_rows() {
        let mut table = table();
        table.handle_filter(FilterCommand::SetGlobal("x-".into()));
        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        assert_eq!(out.iter().filter(|b| **b == b'\n').count(), 2);
    }
}
