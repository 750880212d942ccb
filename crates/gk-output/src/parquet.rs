//! Parquet backend (feature `parquet`).
//!
//! One file per table, Snappy-compressed.  Snapshot tables get one row
//! group per snapshot; tick summaries are buffered and written in batches of
//! [`SUMMARY_BATCH`] rows.
//!
//! `finish()` **must** be called: it writes the Parquet footers, and a file
//! without one cannot be opened by readers.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, Float64Builder, Int64Builder, StringBuilder, UInt8Builder, UInt32Builder,
    UInt64Builder,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::SnapshotWriter;
use crate::{AgentRow, EventRow, OrderRow, OutputError, OutputResult, StationRow, TickSummaryRow};

pub const SUMMARY_BATCH: usize = 1024;

fn order_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("snapshot_tick", DataType::UInt64,  false),
        Field::new("order_id",      DataType::UInt64,  false),
        Field::new("customer_id",   DataType::UInt32,  false),
        Field::new("brand",         DataType::Utf8,    false),
        Field::new("item",          DataType::Utf8,    false),
        Field::new("kitchen",       DataType::Utf8,    true),
        Field::new("state",         DataType::Utf8,    false),
        Field::new("cancel_reason", DataType::Utf8,    true),
        Field::new("step",          DataType::UInt32,  false),
        Field::new("steps_total",   DataType::UInt32,  false),
        Field::new("created",       DataType::UInt64,  false),
        Field::new("ready_at",      DataType::UInt64,  true),
        Field::new("dispatched_at", DataType::UInt64,  true),
        Field::new("delivered_at",  DataType::UInt64,  true),
        Field::new("closed_at",     DataType::UInt64,  true),
        Field::new("driver_id",     DataType::UInt32,  true),
        Field::new("eta_ticks",     DataType::UInt64,  true),
        Field::new("distance_m",    DataType::Float64, true),
        Field::new("rating",        DataType::UInt8,   true),
        Field::new("lat",           DataType::Float64, false),
        Field::new("lon",           DataType::Float64, false),
    ]))
}

fn station_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("snapshot_tick", DataType::UInt64, false),
        Field::new("station",       DataType::Utf8,   false),
        Field::new("kitchen",       DataType::Utf8,   false),
        Field::new("station_type",  DataType::Utf8,   false),
        Field::new("capacity",      DataType::UInt32, false),
        Field::new("occupied",      DataType::UInt32, false),
        Field::new("state",         DataType::Utf8,   false),
        Field::new("occupants",     DataType::Utf8,   false),
    ]))
}

fn agent_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("snapshot_tick", DataType::UInt64,  false),
        Field::new("agent_id",      DataType::UInt32,  false),
        Field::new("role",          DataType::Utf8,    false),
        Field::new("status",        DataType::Utf8,    false),
        Field::new("lat",           DataType::Float64, false),
        Field::new("lon",           DataType::Float64, false),
        Field::new("order_id",      DataType::UInt64,  true),
    ]))
}

fn event_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("tick",         DataType::UInt64, false),
        Field::new("subject_kind", DataType::Utf8,   false),
        Field::new("subject_id",   DataType::UInt64, false),
        Field::new("kind",         DataType::Utf8,   false),
        Field::new("payload",      DataType::Utf8,   false),
    ]))
}

fn summary_schema() -> SchemaRef {
    let u64s = [
        "arrivals", "orders_placed", "cancelled", "steps_started", "steps_completed",
        "dispatched", "delivered", "closed", "warnings", "events", "active_orders",
        "queued_requests", "running_steps",
    ];
    let mut fields = vec![
        Field::new("tick", DataType::UInt64, false),
        Field::new("unix_time_secs", DataType::Int64, false),
    ];
    fields.extend(u64s.iter().map(|n| Field::new(*n, DataType::UInt64, false)));
    fields.push(Field::new("busy_slots", DataType::UInt32, false));
    fields.push(Field::new("total_slots", DataType::UInt32, false));
    fields.push(Field::new("utilization", DataType::Float64, false));
    Arc::new(Schema::new(fields))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder().set_compression(Compression::SNAPPY).build()
}

struct Table {
    schema: SchemaRef,
    writer: ArrowWriter<File>,
}

impl Table {
    fn create(dir: &Path, name: &str, schema: SchemaRef) -> OutputResult<Self> {
        let file = File::create(dir.join(name))?;
        let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(snappy_props()))?;
        Ok(Self { schema, writer })
    }

    fn write(&mut self, columns: Vec<ArrayRef>) -> OutputResult<()> {
        let batch = RecordBatch::try_new(Arc::clone(&self.schema), columns)?;
        self.writer.write(&batch)?;
        Ok(())
    }
}

struct Tables {
    orders:    Table,
    stations:  Table,
    agents:    Table,
    events:    Table,
    summaries: Table,
}

/// Writes the five tables as Parquet files in one directory.
pub struct ParquetWriter {
    tables:  Option<Tables>,
    pending: Vec<TickSummaryRow>,
}

impl ParquetWriter {
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            tables: Some(Tables {
                orders:    Table::create(dir, "orders.parquet", order_schema())?,
                stations:  Table::create(dir, "stations.parquet", station_schema())?,
                agents:    Table::create(dir, "agents.parquet", agent_schema())?,
                events:    Table::create(dir, "events.parquet", event_schema())?,
                summaries: Table::create(dir, "tick_summaries.parquet", summary_schema())?,
            }),
            pending: Vec::new(),
        })
    }

    fn tables(&mut self) -> OutputResult<&mut Tables> {
        self.tables.as_mut().ok_or(OutputError::Finished)
    }

    fn flush_summaries(&mut self) -> OutputResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let rows = std::mem::take(&mut self.pending);
        let mut tick = UInt64Builder::new();
        let mut unix = Int64Builder::new();
        let mut counters: Vec<UInt64Builder> = (0..13).map(|_| UInt64Builder::new()).collect();
        let mut busy = UInt32Builder::new();
        let mut total = UInt32Builder::new();
        let mut util = Float64Builder::new();

        for r in &rows {
            tick.append_value(r.tick);
            unix.append_value(r.unix_time_secs);
            let values = [
                r.arrivals, r.orders_placed, r.cancelled, r.steps_started, r.steps_completed,
                r.dispatched, r.delivered, r.closed, r.warnings, r.events, r.active_orders,
                r.queued_requests, r.running_steps,
            ];
            for (b, v) in counters.iter_mut().zip(values) {
                b.append_value(v);
            }
            busy.append_value(r.busy_slots);
            total.append_value(r.total_slots);
            util.append_value(r.utilization);
        }

        let mut columns: Vec<ArrayRef> = vec![Arc::new(tick.finish()), Arc::new(unix.finish())];
        columns.extend(counters.iter_mut().map(|b| Arc::new(b.finish()) as ArrayRef));
        columns.push(Arc::new(busy.finish()));
        columns.push(Arc::new(total.finish()));
        columns.push(Arc::new(util.finish()));
        self.tables()?.summaries.write(columns)
    }
}

impl SnapshotWriter for ParquetWriter {
    fn write_orders(&mut self, rows: &[OrderRow]) -> OutputResult<()> {
        let table = &mut self.tables()?.orders;
        if rows.is_empty() {
            return Ok(());
        }
        let mut snapshot_tick = UInt64Builder::new();
        let mut order_id = UInt64Builder::new();
        let mut customer_id = UInt32Builder::new();
        let mut brand = StringBuilder::new();
        let mut item = StringBuilder::new();
        let mut kitchen = StringBuilder::new();
        let mut state = StringBuilder::new();
        let mut cancel_reason = StringBuilder::new();
        let mut step = UInt32Builder::new();
        let mut steps_total = UInt32Builder::new();
        let mut created = UInt64Builder::new();
        let mut ready_at = UInt64Builder::new();
        let mut dispatched_at = UInt64Builder::new();
        let mut delivered_at = UInt64Builder::new();
        let mut closed_at = UInt64Builder::new();
        let mut driver_id = UInt32Builder::new();
        let mut eta_ticks = UInt64Builder::new();
        let mut distance_m = Float64Builder::new();
        let mut rating = UInt8Builder::new();
        let mut lat = Float64Builder::new();
        let mut lon = Float64Builder::new();

        for r in rows {
            snapshot_tick.append_value(r.snapshot_tick);
            order_id.append_value(r.order_id);
            customer_id.append_value(r.customer_id);
            brand.append_value(&r.brand);
            item.append_value(&r.item);
            kitchen.append_option(r.kitchen.as_deref());
            state.append_value(r.state);
            cancel_reason.append_option(r.cancel_reason);
            step.append_value(r.step);
            steps_total.append_value(r.steps_total);
            created.append_value(r.created);
            ready_at.append_option(r.ready_at);
            dispatched_at.append_option(r.dispatched_at);
            delivered_at.append_option(r.delivered_at);
            closed_at.append_option(r.closed_at);
            driver_id.append_option(r.driver_id);
            eta_ticks.append_option(r.eta_ticks);
            distance_m.append_option(r.distance_m);
            rating.append_option(r.rating);
            lat.append_value(r.lat);
            lon.append_value(r.lon);
        }

        table.write(vec![
            Arc::new(snapshot_tick.finish()),
            Arc::new(order_id.finish()),
            Arc::new(customer_id.finish()),
            Arc::new(brand.finish()),
            Arc::new(item.finish()),
            Arc::new(kitchen.finish()),
            Arc::new(state.finish()),
            Arc::new(cancel_reason.finish()),
            Arc::new(step.finish()),
            Arc::new(steps_total.finish()),
            Arc::new(created.finish()),
            Arc::new(ready_at.finish()),
            Arc::new(dispatched_at.finish()),
            Arc::new(delivered_at.finish()),
            Arc::new(closed_at.finish()),
            Arc::new(driver_id.finish()),
            Arc::new(eta_ticks.finish()),
            Arc::new(distance_m.finish()),
            Arc::new(rating.finish()),
            Arc::new(lat.finish()),
            Arc::new(lon.finish()),
        ])
    }

    fn write_stations(&mut self, rows: &[StationRow]) -> OutputResult<()> {
        let table = &mut self.tables()?.stations;
        if rows.is_empty() {
            return Ok(());
        }
        let mut snapshot_tick = UInt64Builder::new();
        let mut station = StringBuilder::new();
        let mut kitchen = StringBuilder::new();
        let mut station_type = StringBuilder::new();
        let mut capacity = UInt32Builder::new();
        let mut occupied = UInt32Builder::new();
        let mut state = StringBuilder::new();
        let mut occupants = StringBuilder::new();

        for r in rows {
            snapshot_tick.append_value(r.snapshot_tick);
            station.append_value(&r.station);
            kitchen.append_value(&r.kitchen);
            station_type.append_value(&r.station_type);
            capacity.append_value(r.capacity);
            occupied.append_value(r.occupied);
            state.append_value(r.state);
            occupants.append_value(&r.occupants);
        }

        table.write(vec![
            Arc::new(snapshot_tick.finish()),
            Arc::new(station.finish()),
            Arc::new(kitchen.finish()),
            Arc::new(station_type.finish()),
            Arc::new(capacity.finish()),
            Arc::new(occupied.finish()),
            Arc::new(state.finish()),
            Arc::new(occupants.finish()),
        ])
    }

    fn write_agents(&mut self, rows: &[AgentRow]) -> OutputResult<()> {
        let table = &mut self.tables()?.agents;
        if rows.is_empty() {
            return Ok(());
        }
        let mut snapshot_tick = UInt64Builder::new();
        let mut agent_id = UInt32Builder::new();
        let mut role = StringBuilder::new();
        let mut status = StringBuilder::new();
        let mut lat = Float64Builder::new();
        let mut lon = Float64Builder::new();
        let mut order_id = UInt64Builder::new();

        for r in rows {
            snapshot_tick.append_value(r.snapshot_tick);
            agent_id.append_value(r.agent_id);
            role.append_value(r.role);
            status.append_value(r.status);
            lat.append_value(r.lat);
            lon.append_value(r.lon);
            order_id.append_option(r.order_id);
        }

        table.write(vec![
            Arc::new(snapshot_tick.finish()),
            Arc::new(agent_id.finish()),
            Arc::new(role.finish()),
            Arc::new(status.finish()),
            Arc::new(lat.finish()),
            Arc::new(lon.finish()),
            Arc::new(order_id.finish()),
        ])
    }

    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        let table = &mut self.tables()?.events;
        if rows.is_empty() {
            return Ok(());
        }
        let mut tick = UInt64Builder::new();
        let mut subject_kind = StringBuilder::new();
        let mut subject_id = UInt64Builder::new();
        let mut kind = StringBuilder::new();
        let mut payload = StringBuilder::new();

        for r in rows {
            tick.append_value(r.tick);
            subject_kind.append_value(r.subject_kind);
            subject_id.append_value(r.subject_id);
            kind.append_value(r.kind);
            payload.append_value(&r.payload);
        }

        table.write(vec![
            Arc::new(tick.finish()),
            Arc::new(subject_kind.finish()),
            Arc::new(subject_id.finish()),
            Arc::new(kind.finish()),
            Arc::new(payload.finish()),
        ])
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.tables()?;
        self.pending.push(*row);
        if self.pending.len() >= SUMMARY_BATCH {
            self.flush_summaries()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.tables.is_none() {
            return Ok(());
        }
        self.flush_summaries()?;
        let Some(t) = self.tables.take() else {
            return Ok(());
        };
        t.orders.writer.close()?;
        t.stations.writer.close()?;
        t.agents.writer.close()?;
        t.events.writer.close()?;
        t.summaries.writer.close()?;
        Ok(())
    }
}
