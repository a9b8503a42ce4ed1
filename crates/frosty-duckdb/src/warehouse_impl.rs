use async_trait::async_trait;
use serde_json::Value;

use frosty_core::{
    query::{ColumnType, QuerySpec, SqlParam},
    result::ResultSet,
    warehouse::Warehouse,
};

use crate::DuckDbWarehouse;

fn bind(param: &SqlParam) -> Box<dyn duckdb::types::ToSql> {
    match param {
        SqlParam::Text(s) => Box::new(s.clone()),
        SqlParam::Int(n) => Box::new(*n),
        SqlParam::Timestamp(ts) => Box::new(SqlParam::timestamp_text(ts)),
    }
}

fn read_cell(row: &duckdb::Row<'_>, idx: usize, ty: ColumnType) -> duckdb::Result<Value> {
    let value = match ty {
        ColumnType::Text => row.get::<_, Option<String>>(idx)?.map(Value::from),
        ColumnType::Integer => row.get::<_, Option<i64>>(idx)?.map(Value::from),
        ColumnType::Float => row
            .get::<_, Option<f64>>(idx)?
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
    };
    Ok(value.unwrap_or(Value::Null))
}

#[async_trait]
impl Warehouse for DuckDbWarehouse {
    #[tracing::instrument(skip(self, spec), fields(report = spec.kind.as_str()))]
    async fn execute(&self, spec: &QuerySpec) -> anyhow::Result<ResultSet> {
        let conn = self.conn.lock().await;

        // Boxed params are not `Send`; build them only after the last await.
        let params: Vec<Box<dyn duckdb::types::ToSql>> = spec.params.iter().map(bind).collect();
        let param_refs: Vec<&dyn duckdb::types::ToSql> =
            params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&spec.sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            spec.columns
                .iter()
                .enumerate()
                .map(|(idx, column)| read_cell(row, idx, column.ty))
                .collect::<duckdb::Result<Vec<Value>>>()
        })?;

        let mut result = ResultSet::new(spec.column_names());
        for row in rows {
            result.rows.push(row?);
        }

        tracing::debug!(rows = result.len(), "report query executed");
        Ok(result)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        DuckDbWarehouse::ping(self).await
    }
}
