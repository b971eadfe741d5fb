use log::trace;

use crate::dispatch::ColumnSet;
use crate::error::ConfigurationError;
use crate::filter_cache::{FilterCommand, FilterController};
use crate::record::{Record, RecordCache};
use crate::sort::{SortBy, cycle};
use crate::spec::ModelSpec;
use crate::value::Value;
use crate::{CellCoord, ColumnUid, RowUid};

/// Records + filters + sort of one entity, without any UI or network.
pub struct GridModel {
    spec: ModelSpec,
    key_field: String,
    columns: ColumnSet,
    cache: RecordCache,
    filters: FilterController,
    sort: Option<SortBy>,
    visible: Vec<RowUid>,
}

impl GridModel {
    pub fn new(spec: ModelSpec) -> Result<Self, ConfigurationError> {
        spec.validate()?;
        let key_field = spec.data_key_of()?.to_string();
        Ok(GridModel {
            columns: ColumnSet::new(&spec),
            filters: FilterController::new(&spec)?,
            sort: SortBy::default_for(&spec),
            key_field,
            spec,
            cache: RecordCache::new(),
            visible: vec![],
        })
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    pub fn filters(&self) -> &FilterController {
        &self.filters
    }

    pub fn sort(&self) -> Option<&SortBy> {
        self.sort.as_ref()
    }

    pub fn visible_rows(&self) -> &[RowUid] {
        &self.visible
    }

    pub fn record(&self, row_uid: RowUid) -> Option<&Record> {
        self.cache.get(row_uid)
    }

    pub fn field_of(&self, col_uid: ColumnUid) -> Option<&str> {
        self.spec.field_at(col_uid.0 as usize).map(|(name, _)| name)
    }

    pub fn cell(&self, coord: CellCoord) -> Option<&Value> {
        let field = self.field_of(coord.col_uid)?;
        self.cache.get(coord.row_uid)?.get(field)
    }

    /// Full replacement after a (re)load.
    pub fn replace_records(&mut self, records: Vec<Record>) {
        self.cache.replace_all(records);
        self.refresh_visible();
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.visible.clear();
    }

    /// Server-confirmed create or update.
    pub fn apply_saved(&mut self, record: Record) -> RowUid {
        let row_uid = self.cache.reconcile_upsert(&self.key_field, record);
        self.refresh_visible();
        row_uid
    }

    /// Server-confirmed delete of `id`.
    pub fn apply_removed(&mut self, id: &str) -> Option<Record> {
        let removed = self.cache.reconcile_remove(&self.key_field, id);
        if removed.is_some() {
            self.refresh_visible();
        }
        removed
    }

    /// Returns true when the visible row set was recomputed.
    pub fn handle_filter(&mut self, command: FilterCommand) -> bool {
        let changed = self.filters.handle(command);
        if changed {
            self.refresh_visible();
        }
        changed
    }

    pub fn set_sort(&mut self, sort: Option<SortBy>) {
        self.sort = sort;
        self.refresh_visible();
    }

    /// Header click on `field`.
    pub fn cycle_sort(&mut self, field: &str) {
        let next = cycle(self.sort.as_ref(), field);
        self.set_sort(next);
    }

    fn refresh_visible(&mut self) {
        let state = self.filters.state();
        let mut rows = self
            .cache
            .iter()
            .filter(|(_, record)| state.matches(&self.spec, record))
            .collect::<Vec<_>>();
        if let Some(sort) = &self.sort {
            rows.sort_by(|(_, a), (_, b)| sort.compare(a, b));
        }
        self.visible = rows.into_iter().map(|(uid, _)| uid).collect();
        trace!("{} of {} rows visible", self.visible.len(), self.cache.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterValue, MatchMode};
    use crate::spec::FieldSpec;
    use pretty_assertions::assert_eq;

    fn grid() -> GridModel {
        let mut grid = GridModel::new(ModelSpec::new([
            ("name", FieldSpec::text().frozen()),
            ("length", FieldSpec::number().decimals(2)),
            ("starship_id", FieldSpec::id().data_key().read_only()),
        ]))
        .unwrap();
        grid.replace_records(vec![
            ship(1, "X-wing", 12.5),
            ship(2, "Death Star", 120000.0),
            ship(3, "A-wing", 9.6),
        ]);
        grid
    }

    fn ship(id: i64, name: &str, length: f64) -> Record {
        Record::from_iter([
            ("name", Value::from(name)),
            ("length", Value::from(length)),
            ("starship_id", Value::from(id)),
        ])
    }

    fn names(grid: &GridModel) -> Vec<String> {
        grid.visible_rows()
            .iter()
            .filter_map(|uid| grid.record(*uid))
            .map(|r| r.get_or_null("name").to_string())
            .collect()
    }

    #[test]
    fn sorted_by_name_on_load() {
        assert_eq!(names(&grid()), ["A-wing", "Death Star", "X-wing"]);
    }

    #[test]
    fn filters_apply_only_on_apply() {
        let mut grid = grid();
        assert!(!grid.handle_filter(FilterCommand::edit(
            "length",
            0,
            FilterValue::range(Some(10.0), None)
        )));
        assert_eq!(grid.visible_rows().len(), 3);
        grid.handle_filter(FilterCommand::apply("length"));
        assert_eq!(names(&grid), ["Death Star", "X-wing"]);
        grid.handle_filter(FilterCommand::clear("length"));
        assert_eq!(grid.visible_rows().len(), 3);
    }

    #[test]
    fn match_mode_switch_keeps_rows_until_apply() {
        let mut grid = grid();
        grid.handle_filter(FilterCommand::edit("name", 0, FilterValue::Text("wing".into())));
        grid.handle_filter(FilterCommand::apply("name"));
        assert_eq!(names(&grid), ["A-wing", "X-wing"]);

        assert!(!grid.handle_filter(FilterCommand::EditMatchMode {
            field: "name".into(),
            index: 0,
            match_mode: MatchMode::Equals,
        }));
        assert_eq!(names(&grid), ["A-wing", "X-wing"]);

        grid.handle_filter(FilterCommand::apply("name"));
        assert!(grid.visible_rows().is_empty());
    }

    #[test]
    fn global_search() {
        let mut grid = grid();
        grid.handle_filter(FilterCommand::SetGlobal("wing".into()));
        assert_eq!(names(&grid), ["A-wing", "X-wing"]);
        grid.handle_filter(FilterCommand::ClearAll);
        assert_eq!(grid.visible_rows().len(), 3);
    }

    #[test]
    fn saved_record_replaces_in_place() {
        let mut grid = grid();
        let before = grid.cache().len();
        grid.apply_saved(ship(2, "Death Star II", 160000.0));
        assert_eq!(grid.cache().len(), before);
        assert_eq!(names(&grid), ["A-wing", "Death Star II", "X-wing"]);
        grid.apply_saved(ship(4, "B-wing", 16.9));
        assert_eq!(grid.cache().len(), before + 1);
    }

    #[test]
    fn removed_record_disappears() {
        let mut grid = grid();
        assert!(grid.apply_removed("2").is_some());
        assert_eq!(names(&grid), ["A-wing", "X-wing"]);
        assert!(grid.apply_removed("2").is_none());
    }

    #[test]
    fn cell_lookup_by_column_position() {
        let grid = grid();
        let row_uid = grid.visible_rows()[0];
        let coord = CellCoord {
            row_uid,
            col_uid: ColumnUid(0),
        };
        assert_eq!(grid.cell(coord), Some(&Value::from("A-wing")));
    }

    #[test]
    fn sort_cycle_ends_unsorted() {
        let mut grid = grid();
        grid.cycle_sort("name");
        assert_eq!(names(&grid), ["X-wing", "Death Star", "A-wing"]);
        grid.cycle_sort("name");
        assert_eq!(grid.sort(), None);
        assert_eq!(names(&grid), ["X-wing", "Death Star", "A-wing"]);
    }
}
