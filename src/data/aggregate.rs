use std::collections::BTreeMap;

use polars::prelude::{
    col, len, DataFrame, DataType, Expr, IntoLazy, NamedFrom, PolarsResult, Series,
};

use super::filter::Predicate;
use super::model::{Field, Record, Value};

// ---------------------------------------------------------------------------
// AggTable – a small materialised result table
// ---------------------------------------------------------------------------

/// Grouped result: key columns followed by one metric column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl AggTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of key columns (everything but the trailing metric).
    pub fn key_width(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }

    /// Position of a column by name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Metric value of a row.
    pub fn metric(row: &[Value]) -> i64 {
        row.last().and_then(Value::as_i64).unwrap_or(0)
    }

    /// Order rows by the metric, largest first.  Ties keep their key order.
    pub fn sort_by_value_desc(&mut self) {
        self.rows
            .sort_by(|a, b| Self::metric(b).cmp(&Self::metric(a)));
    }

    /// Sum the metric over the first `depth` key columns.
    ///
    /// `rollup(0)` is the grand total; `rollup(key_width())` is the table itself.
    pub fn rollup(&self, depth: usize) -> AggTable {
        let depth = depth.min(self.key_width());
        let mut sums: BTreeMap<Vec<Value>, i64> = BTreeMap::new();
        for row in &self.rows {
            *sums.entry(row[..depth].to_vec()).or_default() += Self::metric(row);
        }

        let mut columns: Vec<String> = self.columns[..depth].to_vec();
        columns.extend(self.columns.last().cloned());
        AggTable {
            columns,
            rows: sums
                .into_iter()
                .map(|(mut key, total)| {
                    key.push(Value::Integer(total));
                    key
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Group-by
// ---------------------------------------------------------------------------

/// What to compute per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Number of rows.
    Rows,
    /// Number of rows where the field is present.
    Count(Field),
    /// Number of distinct present values of the field.
    Distinct(Field),
}

impl Metric {
    fn field(self) -> Option<Field> {
        match self {
            Metric::Rows => None,
            Metric::Count(field) | Metric::Distinct(field) => Some(field),
        }
    }

    fn to_expr(self) -> Expr {
        match self {
            Metric::Rows => len(),
            Metric::Count(field) => col(field.name()).count(),
            Metric::Distinct(field) => col(field.name()).drop_nulls().n_unique(),
        }
    }
}

/// Filter `records` with `predicates`, group by `keys` and compute `metric`,
/// naming the result column `metric_name`.
///
/// Rows with an absent key are left out, so no group has a null key.
/// Groups come out in ascending key order.
pub fn group_by(
    records: &[Record],
    predicates: &[Predicate<'_>],
    keys: &[Field],
    metric: Metric,
    metric_name: &str,
) -> PolarsResult<AggTable> {
    let mut fields: Vec<Field> = keys.to_vec();
    fields.extend(metric.field());
    fields.extend(predicates.iter().map(Predicate::field));
    let mut lf = frame(records, &fields)?.lazy();

    let conditions = predicates
        .iter()
        .map(Predicate::to_expr)
        .chain(keys.iter().map(|f| col(f.name()).is_not_null()));
    if let Some(condition) = conditions.reduce(|acc, e| acc.and(e)) {
        lf = lf.filter(condition);
    }

    let key_exprs: Vec<Expr> = keys.iter().map(|f| col(f.name())).collect();
    let df = lf
        .group_by(key_exprs)
        .agg([metric.to_expr().cast(DataType::Int64).alias(metric_name)])
        .collect()?;

    let mut rows: Vec<Vec<Value>> = vec![Vec::with_capacity(keys.len() + 1); df.height()];
    for field in keys {
        let column = df.column(field.name())?;
        let cells: Vec<Value> = if field.is_integer() {
            column.i64()?.into_iter().map(Value::from).collect()
        } else {
            column.str()?.into_iter().map(Value::from).collect()
        };
        for (row, cell) in rows.iter_mut().zip(cells) {
            row.push(cell);
        }
    }
    for (row, n) in rows.iter_mut().zip(df.column(metric_name)?.i64()?.into_iter()) {
        row.push(Value::Integer(n.unwrap_or(0)));
    }
    rows.sort_by(|a, b| a[..keys.len()].cmp(&b[..keys.len()]));

    let mut columns: Vec<String> = keys.iter().map(|f| f.name().to_string()).collect();
    columns.push(metric_name.to_string());
    Ok(AggTable { columns, rows })
}

/// One polars column per distinct field, in first-mention order.
fn frame(records: &[Record], fields: &[Field]) -> PolarsResult<DataFrame> {
    let mut seen = Vec::with_capacity(fields.len());
    let mut columns = Vec::with_capacity(fields.len());
    for &field in fields {
        if seen.contains(&field) {
            continue;
        }
        seen.push(field);
        columns.push(series(records, field));
    }
    DataFrame::new(columns)
}

fn series(records: &[Record], field: Field) -> Series {
    if field.is_integer() {
        let values: Vec<Option<i64>> = records.iter().map(|r| r.value(field).as_i64()).collect();
        Series::new(field.name(), values)
    } else {
        let values: Vec<Option<String>> = records.iter().map(|r| r.value(field).as_text()).collect();
        Series::new(field.name(), values)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::model::tests::record;
    use crate::data::model::NO_MEDAL;

    fn records() -> Vec<Record> {
        vec![
            record(1, Some("USA"), 2000, "Gold"),
            record(1, Some("USA"), 2000, "Silver"),
            record(2, Some("USA"), 2004, NO_MEDAL),
            record(3, Some("France"), 2000, "Gold"),
            record(4, None, 2000, "Bronze"),
        ]
    }

    #[test]
    fn rows_metric_counts_per_key_in_key_order() {
        let table = group_by(&records(), &[], &[Field::Country], Metric::Rows, "Count").unwrap();

        assert_eq!(table.columns, vec!["Country", "Count"]);
        assert_eq!(
            table.rows,
            vec![
                vec![Value::from("France"), Value::Integer(1)],
                vec![Value::from("USA"), Value::Integer(3)],
            ]
        );
    }

    #[test]
    fn distinct_metric_ignores_repeats_and_nulls() {
        let recs = records();

        let athletes =
            group_by(&recs, &[], &[Field::Year], Metric::Distinct(Field::Id), "Athletes").unwrap();
        assert_eq!(
            athletes.rows,
            vec![
                vec![Value::Integer(2000), Value::Integer(3)],
                vec![Value::Integer(2004), Value::Integer(1)],
            ]
        );

        let countries =
            group_by(&recs, &[], &[Field::Year], Metric::Distinct(Field::Country), "Countries")
                .unwrap();
        assert_eq!(countries.rows[0], vec![Value::Integer(2000), Value::Integer(2)]);
    }

    #[test]
    fn count_metric_skips_absent_values() {
        let table =
            group_by(&records(), &[], &[Field::Year], Metric::Count(Field::Country), "Count")
                .unwrap();
        assert_eq!(table.rows[0], vec![Value::Integer(2000), Value::Integer(3)]);
    }

    #[test]
    fn predicates_filter_before_grouping() {
        let recs = records();
        let table = group_by(
            &recs,
            &[Predicate::WithMedal, Predicate::YearRange(2000, 2000)],
            &[Field::Medal],
            Metric::Rows,
            "Count",
        )
        .unwrap();
        assert_eq!(
            table.rows,
            vec![
                vec![Value::from("Bronze"), Value::Integer(1)],
                vec![Value::from("Gold"), Value::Integer(2)],
                vec![Value::from("Silver"), Value::Integer(1)],
            ]
        );
    }

    #[test]
    fn expressions_agree_with_row_predicates() {
        let mut recs = records();
        recs[1].kind = None;
        recs[3].season = "Winter".to_string();
        let summer: BTreeSet<String> = ["Summer".to_string()].into_iter().collect();
        let t1: BTreeSet<String> = ["T1".to_string()].into_iter().collect();
        let none = BTreeSet::new();

        let cases = [
            Predicate::Seasons(&summer),
            Predicate::Seasons(&none),
            Predicate::Types(&t1),
            Predicate::YearRange(2001, 2004),
            Predicate::Year(2000),
            Predicate::Country("USA"),
            Predicate::Sex("F"),
            Predicate::WithMedal,
        ];
        for predicate in cases {
            let expected = recs.iter().filter(|r| predicate.matches(r)).count() as i64;
            let table = group_by(
                &recs,
                std::slice::from_ref(&predicate),
                &[Field::Sport],
                Metric::Rows,
                "Count",
            )
            .unwrap();
            let counted = table.rows.first().map_or(0, |row| AggTable::metric(row));
            assert_eq!(counted, expected, "{predicate:?}");
        }
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = group_by(&[], &[], &[Field::Country], Metric::Rows, "Count").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns, vec!["Country", "Count"]);
    }

    #[test]
    fn sort_desc_is_stable_on_ties() {
        let mut table = AggTable {
            columns: vec!["Country".into(), "Count".into()],
            rows: vec![
                vec![Value::from("A"), Value::Integer(1)],
                vec![Value::from("B"), Value::Integer(5)],
                vec![Value::from("C"), Value::Integer(1)],
            ],
        };
        table.sort_by_value_desc();
        let order: Vec<String> = table.rows.iter().map(|r| r[0].to_string()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[test]
    fn rollup_sums_over_key_prefix() {
        let table = group_by(
            &records(),
            &[],
            &[Field::Country, Field::Medal],
            Metric::Rows,
            "Count",
        )
        .unwrap();

        let by_country = table.rollup(1);
        assert_eq!(by_country.columns, vec!["Country", "Count"]);
        assert_eq!(
            by_country.rows,
            vec![
                vec![Value::from("France"), Value::Integer(1)],
                vec![Value::from("USA"), Value::Integer(3)],
            ]
        );
        assert_eq!(table.rollup(0).rows, vec![vec![Value::Integer(4)]]);
        assert_eq!(table.rollup(5), table);
    }
}
