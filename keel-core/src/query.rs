use crate::{
    BinaryOpType, BlockingExecutor, Driver, Executor, Expression, Operand, Order, Ordered,
    QueryResult, Result, RowCursor, RowLabeled, Session, SqlWriter, TableRef, Value,
    statement::combined_condition,
};
use anyhow::bail;
use async_stream::stream;
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// Flattened form of a selection handed to the writer.
pub struct SelectPlan<'a> {
    pub fields: &'a [Arc<dyn Expression>],
    pub aliases: Option<&'a [String]>,
    pub from: &'a TableRef,
    pub condition: Option<&'a dyn Expression>,
    pub group_by: &'a [Arc<dyn Expression>],
    pub order_by: &'a [Ordered<Arc<dyn Expression>>],
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub for_update: bool,
    pub distinct: bool,
    pub distinct_on: &'a [Arc<dyn Expression>],
}

/// A fetched row along with the projection mapping of its query.
///
/// Duplicate fields are sent to the backend once, `value` routes the original
/// field positions to the physical columns of the row.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub row: RowLabeled,
    mapping: Arc<[usize]>,
}

impl ResultRow {
    pub fn value(&self, field: usize) -> Option<&Value> {
        let physical = self.mapping.get(field).copied().unwrap_or(field);
        self.row.values.get(physical)
    }

    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.row.get_column(name)
    }
}

/// Composable SELECT over a single table.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    from: TableRef,
    fields: Vec<Arc<dyn Expression>>,
    condition: Option<Arc<dyn Expression>>,
    group_by: Vec<Arc<dyn Expression>>,
    order_by: Vec<Ordered<Arc<dyn Expression>>>,
    limit: Option<u64>,
    offset: Option<u64>,
    for_update: bool,
    distinct: bool,
    distinct_on: Vec<Arc<dyn Expression>>,
}

impl SelectQuery {
    pub fn new(from: TableRef) -> Self {
        Self {
            from,
            fields: Vec::new(),
            condition: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            for_update: false,
            distinct: false,
            distinct_on: Vec::new(),
        }
    }

    pub fn field(mut self, expression: impl Expression + 'static) -> Self {
        self.fields.push(Arc::new(expression));
        self
    }

    pub fn filter(mut self, condition: impl Expression + 'static) -> Result<Self> {
        if self.condition.is_some() {
            bail!("Condition is already set, use and_filter or or_filter to combine");
        }
        self.condition = Some(Arc::new(condition));
        Ok(self)
    }

    pub fn and_filter(mut self, condition: impl Expression + 'static) -> Self {
        self.condition = Some(combined_condition(
            self.condition.take(),
            condition,
            BinaryOpType::And,
        ));
        self
    }

    pub fn or_filter(mut self, condition: impl Expression + 'static) -> Self {
        self.condition = Some(combined_condition(
            self.condition.take(),
            condition,
            BinaryOpType::Or,
        ));
        self
    }

    pub fn group_by(mut self, expression: impl Expression + 'static) -> Self {
        self.group_by.push(Arc::new(expression));
        self
    }

    pub fn order_by(mut self, expression: impl Expression + 'static, order: Order) -> Self {
        self.order_by.push(Ordered {
            order,
            expression: Arc::new(expression) as Arc<dyn Expression>,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    pub fn distinct(mut self) -> Result<Self> {
        if !self.distinct_on.is_empty() {
            bail!("DISTINCT cannot be combined with DISTINCT ON");
        }
        self.distinct = true;
        Ok(self)
    }

    pub fn distinct_on(mut self, expression: impl Expression + 'static) -> Result<Self> {
        if self.distinct {
            bail!("DISTINCT ON cannot be combined with DISTINCT");
        }
        self.distinct_on.push(Arc::new(expression));
        Ok(self)
    }

    fn plan<'a>(&'a self, fields: &'a [Arc<dyn Expression>], aliases: Option<&'a [String]>) -> SelectPlan<'a> {
        SelectPlan {
            fields,
            aliases,
            from: &self.from,
            condition: self.condition.as_deref(),
            group_by: &self.group_by,
            order_by: &self.order_by,
            limit: self.limit,
            offset: self.offset,
            for_update: self.for_update,
            distinct: self.distinct,
            distinct_on: &self.distinct_on,
        }
    }

    pub fn render(&self, writer: &dyn SqlWriter) -> String {
        let asterisk;
        let fields: &[Arc<dyn Expression>] = if self.fields.is_empty() {
            asterisk = [Arc::new(Operand::Asterisk) as Arc<dyn Expression>];
            &asterisk
        } else {
            &self.fields
        };
        let mut out = String::with_capacity(256);
        writer.write_select(&mut out, &self.plan(fields, None));
        out
    }

    /// Collapses repeated projections, returning the physical fields and the
    /// original-to-physical index mapping.
    fn dedup_projection(
        &self,
        writer: &dyn SqlWriter,
    ) -> (Vec<Arc<dyn Expression>>, Vec<usize>) {
        let mut unique: Vec<Arc<dyn Expression>> = Vec::with_capacity(self.fields.len());
        let mut rendered: Vec<String> = Vec::with_capacity(self.fields.len());
        let mut mapping = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let mut sql = String::new();
            field.write_query(writer, &mut sql, false);
            match rendered.iter().position(|v| *v == sql) {
                Some(i) => mapping.push(i),
                None => {
                    mapping.push(unique.len());
                    unique.push(field.clone());
                    rendered.push(sql);
                }
            }
        }
        (unique, mapping)
    }

    fn render_deduped(&self, writer: &dyn SqlWriter) -> (String, Arc<[usize]>) {
        if self.fields.is_empty() {
            return (self.render(writer), Vec::new().into());
        }
        let (fields, mapping) = self.dedup_projection(writer);
        let mut out = String::with_capacity(256);
        writer.write_select(&mut out, &self.plan(&fields, None));
        (out, mapping.into())
    }

    /// A scalar count needs the full selection as a derived table whenever a
    /// modifier changes the row multiplicity.
    fn requires_wrapped_count(&self) -> bool {
        self.distinct
            || !self.distinct_on.is_empty()
            || !self.group_by.is_empty()
            || self.limit.is_some()
            || self.offset.is_some()
    }

    fn render_count(&self, writer: &dyn SqlWriter) -> String {
        let mut out = String::with_capacity(256);
        if self.requires_wrapped_count() {
            let (fields, _) = self.dedup_projection(writer);
            let asterisk;
            let fields: &[Arc<dyn Expression>] = if fields.is_empty() {
                asterisk = [Arc::new(Operand::Asterisk) as Arc<dyn Expression>];
                &asterisk
            } else {
                &fields
            };
            let aliases = fields
                .iter()
                .enumerate()
                .map(|(i, field)| match field.as_column() {
                    Some(column) => format!("{}_{}", column.table, column.name),
                    None => format!("exp{}", i),
                })
                .collect::<Vec<_>>();
            writer.write_wrapped_count(&mut out, &self.plan(fields, Some(&aliases)));
        } else {
            writer.write_select_count(&mut out, &self.from, self.condition.as_deref());
        }
        out
    }

    pub fn stream<'a, E: Executor>(
        &self,
        session: &'a mut Session<E>,
    ) -> impl Stream<Item = Result<ResultRow>> + 'a {
        let writer = session.channel().driver().sql_writer();
        let (sql, mapping) = self.render_deduped(writer.as_dyn());
        let guard = session.row_tracker().track();
        let rows = session.channel_mut().fetch(sql);
        stream! {
            let _guard = guard;
            for await row in rows {
                yield row.map(|row| ResultRow {
                    row,
                    mapping: mapping.clone(),
                });
            }
        }
    }

    pub async fn fetch_all<E: Executor>(&self, session: &mut Session<E>) -> Result<Vec<ResultRow>> {
        let mut results = Vec::new();
        let mut rows = std::pin::pin!(self.stream(session));
        while let Some(row) = rows.next().await {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn fetch_all_blocking<E: BlockingExecutor>(
        &self,
        session: &mut Session<E>,
    ) -> Result<Vec<ResultRow>> {
        let writer = session.channel().driver().sql_writer();
        let (sql, mapping) = self.render_deduped(writer.as_dyn());
        let _guard = session.row_tracker().track();
        let mut cursor = session.channel_mut().run_blocking(sql)?;
        let mut results = Vec::new();
        let outcome = loop {
            match cursor.next_result() {
                Ok(Some(QueryResult::Row(row))) => results.push(ResultRow {
                    row,
                    mapping: mapping.clone(),
                }),
                Ok(Some(..)) => {}
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        let closed = cursor.close();
        outcome?;
        closed?;
        Ok(results)
    }

    /// Number of rows the selection yields, without transferring them.
    pub async fn count<E: Executor>(&self, session: &mut Session<E>) -> Result<u64> {
        let writer = session.channel().driver().sql_writer();
        let sql = self.render_count(writer.as_dyn());
        count_result(session.fetch_one(sql).await?)
    }

    pub fn count_blocking<E: BlockingExecutor>(&self, session: &mut Session<E>) -> Result<u64> {
        let writer = session.channel().driver().sql_writer();
        let sql = self.render_count(writer.as_dyn());
        count_result(session.fetch_one_blocking(sql)?)
    }

    /// Whether the selection yields no row, probing at most one.
    ///
    /// FOR UPDATE keeps its row multiplicity, the probe limit is only applied
    /// without it.
    pub async fn is_empty<E: Executor>(&self, session: &mut Session<E>) -> Result<bool> {
        let sql = {
            let writer = session.channel().driver().sql_writer();
            self.probe_query().render(writer.as_dyn())
        };
        Ok(session.fetch_one(sql).await?.is_none())
    }

    pub fn is_empty_blocking<E: BlockingExecutor>(
        &self,
        session: &mut Session<E>,
    ) -> Result<bool> {
        let sql = {
            let writer = session.channel().driver().sql_writer();
            self.probe_query().render(writer.as_dyn())
        };
        Ok(session.fetch_one_blocking(sql)?.is_none())
    }

    fn probe_query(&self) -> Self {
        let mut probe = self.clone();
        if !probe.for_update {
            probe.limit = Some(1);
        }
        probe
    }
}

fn count_result(row: Option<RowLabeled>) -> Result<u64> {
    let Some(row) = row else {
        bail!("Count query returned no row");
    };
    match row.values.first() {
        Some(Value::Int16(Some(v))) => Ok(*v as u64),
        Some(Value::Int32(Some(v))) => Ok(*v as u64),
        Some(Value::Int64(Some(v))) => Ok(*v as u64),
        Some(Value::UInt64(Some(v))) => Ok(*v),
        v => bail!("Count query returned a non numeric value: {:?}", v),
    }
}
