//! Writer and observer tests.

#[cfg(test)]
mod fixtures {
    use std::sync::Arc;

    use gk_behavior::{Decision, ScriptedModel};
    use gk_core::{BrandId, GeoPoint, MenuItemId, SiteId, Tick};
    use gk_setup::{BrandTemplate, EngineParams, SiteTemplate, template_source};
    use gk_sim::{Sim, SimBuilder};

    use crate::{EventRow, OrderRow, TickSummaryRow};

    pub fn tmp() -> tempfile::TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    pub fn order_row(id: u64) -> OrderRow {
        OrderRow {
            snapshot_tick: 9,
            order_id: id,
            customer_id: 3,
            brand: "fast-food".into(),
            item: "burger".into(),
            kitchen: None,
            state: "placed",
            cancel_reason: None,
            step: 0,
            steps_total: 2,
            created: 8,
            ready_at: None,
            dispatched_at: None,
            delivered_at: None,
            closed_at: None,
            driver_id: None,
            eta_ticks: None,
            distance_m: Some(812.5),
            rating: None,
            lat: 52.37,
            lon: 4.9,
        }
    }

    pub fn event_row(tick: u64) -> EventRow {
        EventRow {
            tick,
            subject_kind: "order",
            subject_id: 1,
            kind: "order_ready",
            payload: r#"{"type":"order_ready"}"#.into(),
        }
    }

    pub fn summary_row(tick: u64) -> TickSummaryRow {
        TickSummaryRow {
            tick,
            unix_time_secs: tick as i64 * 60,
            arrivals: 2,
            orders_placed: 1,
            cancelled: 0,
            steps_started: 1,
            steps_completed: 0,
            dispatched: 0,
            delivered: 0,
            closed: 0,
            warnings: 0,
            events: 4,
            active_orders: 1,
            queued_requests: 0,
            running_steps: 1,
            busy_slots: 1,
            total_slots: 4,
            utilization: 0.25,
        }
    }

    /// Template network with a handful of scripted orders.
    pub fn small_sim(ticks: u64, snapshot_every: u64) -> Sim<ScriptedModel> {
        let mut source = template_source(&[SiteTemplate::Amsterdam], &[BrandTemplate::FastFood]);
        source.params = EngineParams {
            snapshot_interval_ticks: snapshot_every,
            traffic_variation: 0.0,
            ..EngineParams::default()
        };
        let setup = Arc::new(source.build().unwrap());
        let site = setup.sites[0].location;
        let model = (0..4).fold(ScriptedModel::new(), |m, t| {
            m.at(Tick(t), SiteId(0), Decision::PlaceOrder {
                position: GeoPoint::new(site.lat + 0.004, site.lon),
                satisfaction_bias: 0.0,
                brand: BrandId(0),
                item: MenuItemId((t % 2) as u32),
            })
        });
        SimBuilder::new(setup, model).duration(ticks).build().unwrap()
    }
}

#[cfg(test)]
mod csv_tests {
    use super::fixtures::{event_row, order_row, summary_row, tmp};
    use crate::csv::{EVENT_COLUMNS, ORDER_COLUMNS, SUMMARY_COLUMNS};
    use crate::{CsvWriter, OutputError, SnapshotWriter};

    fn headers(path: std::path::PathBuf) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    #[test]
    fn files_and_headers() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        for f in ["orders.csv", "stations.csv", "agents.csv", "events.csv", "tick_summaries.csv"] {
            assert!(dir.path().join(f).exists(), "{f} missing");
        }
        assert_eq!(headers(dir.path().join("orders.csv")), ORDER_COLUMNS);
        assert_eq!(headers(dir.path().join("events.csv")), EVENT_COLUMNS);
        assert_eq!(headers(dir.path().join("tick_summaries.csv")), SUMMARY_COLUMNS);
    }

    #[test]
    fn missing_values_are_empty_fields() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_orders(&[order_row(1), order_row(2)]).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("orders.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "1");
        assert_eq!(&rows[0][5], ""); // kitchen
        assert_eq!(&rows[0][6], "placed");
        assert_eq!(&rows[0][17], "812.5");
        assert_eq!(&rows[1][1], "2");
    }

    #[test]
    fn json_payload_survives_quoting() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_events(&[event_row(4)]).unwrap();
        w.write_tick_summary(&summary_row(4)).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("events.csv")).unwrap();
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[4], r#"{"type":"order_ready"}"#);

        let mut rdr = csv::Reader::from_path(dir.path().join("tick_summaries.csv")).unwrap();
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "240");
        assert_eq!(&row[17], "0.25");
    }

    #[test]
    fn finish_is_idempotent_and_final() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
        assert!(matches!(w.write_events(&[event_row(1)]), Err(OutputError::Finished)));
    }
}

#[cfg(test)]
mod format {
    use crate::{OutputError, OutputFormat, open_writer};

    #[test]
    fn parse_formats() {
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("Parquet".parse::<OutputFormat>().unwrap(), OutputFormat::Parquet);
        assert!(matches!("xlsx".parse::<OutputFormat>(), Err(OutputError::UnsupportedFormat(_))));
        assert_eq!(OutputFormat::default(), OutputFormat::Parquet);
    }

    #[test]
    fn open_writer_creates_the_directory() {
        let dir = super::fixtures::tmp();
        let out = dir.path().join("nested").join("run");
        let mut w = open_writer(OutputFormat::Csv, &out).unwrap();
        w.finish().unwrap();
        assert!(out.join("orders.csv").exists());
    }
}

#[cfg(test)]
mod observer {
    use gk_core::Tick;

    use super::fixtures::{small_sim, tmp};
    use crate::{CsvWriter, SnapshotObserver};

    fn count_rows(path: std::path::PathBuf) -> usize {
        csv::Reader::from_path(path).unwrap().records().count()
    }

    #[test]
    fn run_writes_every_table() {
        let dir = tmp();
        let mut sim = small_sim(40, 10);
        let mut obs = SnapshotObserver::new(CsvWriter::new(dir.path()).unwrap(), sim.config());
        sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());
        assert_eq!(obs.snapshots(), 4);

        let p = dir.path();
        assert_eq!(count_rows(p.join("tick_summaries.csv")), 40);
        assert_eq!(count_rows(p.join("events.csv")), sim.world().events().len());
        let stations = sim.world().setup().stations.len();
        assert_eq!(count_rows(p.join("stations.csv")), stations * 4);
        assert!(count_rows(p.join("agents.csv")) >= sim.world().agents().len());
        assert!(count_rows(p.join("orders.csv")) >= 4);
    }

    #[test]
    fn archived_orders_are_written_once() {
        let dir = tmp();
        let mut sim = small_sim(60, 5);
        let mut obs = SnapshotObserver::new(CsvWriter::new(dir.path()).unwrap(), sim.config());
        sim.run(&mut obs).unwrap();
        assert_eq!(sim.world().archived_orders().count(), 4);

        let mut rdr = csv::Reader::from_path(dir.path().join("orders.csv")).unwrap();
        let closed = rdr
            .records()
            .map(|r| r.unwrap())
            .filter(|r| &r[6] == "closed")
            .count();
        assert_eq!(closed, 4);
    }

    #[test]
    fn finished_customers_are_written_once() {
        let dir = tmp();
        let mut sim = small_sim(60, 5);
        let mut obs = SnapshotObserver::new(CsvWriter::new(dir.path()).unwrap(), sim.config());
        sim.run(&mut obs).unwrap();
        let agents = sim.world().agents();
        assert_eq!(agents.retired_len(), 4);

        let rows: Vec<csv::StringRecord> = csv::Reader::from_path(dir.path().join("agents.csv"))
            .unwrap()
            .records()
            .map(|r| r.unwrap())
            .collect();
        let mut done: Vec<&str> = rows.iter().filter(|r| &r[3] == "done").map(|r| &r[1]).collect();
        done.sort_unstable();
        done.dedup();
        assert_eq!(rows.iter().filter(|r| &r[3] == "done").count(), 4);
        assert_eq!(done.len(), 4);

        // The last snapshot holds live agents plus those retired after the
        // one before it, never the whole history.
        let last = rows.iter().filter(|r| &r[0] == "59").count();
        assert_eq!(last, agents.live_len() + agents.retired_since(Some(Tick(54))).count());
    }

    #[test]
    fn events_flushed_at_end_without_snapshot() {
        let dir = tmp();
        let mut sim = small_sim(100, 1_000);
        let mut obs = SnapshotObserver::new(CsvWriter::new(dir.path()).unwrap(), sim.config());
        // Stop before the last tick so no snapshot is ever taken.
        sim.run_ticks(20, &mut obs).unwrap();
        gk_sim::SimObserver::on_sim_end(&mut obs, Tick(20), sim.world());
        assert_eq!(obs.snapshots(), 0);
        let events = csv::Reader::from_path(dir.path().join("events.csv")).unwrap().records().count();
        assert_eq!(events, sim.world().events().len());
    }
}

#[cfg(all(test, feature = "parquet"))]
mod parquet_tests {
    use std::fs::File;

    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    use super::fixtures::{event_row, order_row, small_sim, summary_row, tmp};
    use crate::{ParquetWriter, SnapshotObserver, SnapshotWriter};

    fn rows_in(path: std::path::PathBuf) -> usize {
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
            .unwrap()
            .build()
            .unwrap();
        reader.map(|b| b.unwrap().num_rows()).sum()
    }

    #[test]
    fn tables_round_trip_row_counts() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.write_orders(&[order_row(1), order_row(2), order_row(3)]).unwrap();
        w.write_events(&[event_row(1), event_row(2)]).unwrap();
        for t in 0..5 {
            w.write_tick_summary(&summary_row(t)).unwrap();
        }
        w.finish().unwrap();
        w.finish().unwrap();

        let p = dir.path();
        assert_eq!(rows_in(p.join("orders.parquet")), 3);
        assert_eq!(rows_in(p.join("events.parquet")), 2);
        assert_eq!(rows_in(p.join("tick_summaries.parquet")), 5);
        assert_eq!(rows_in(p.join("stations.parquet")), 0);
    }

    #[test]
    fn nullable_columns_keep_nulls() {
        use arrow::array::Array;

        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.write_orders(&[order_row(7)]).unwrap();
        w.finish().unwrap();

        let mut reader = ParquetRecordBatchReaderBuilder::try_new(File::open(dir.path().join("orders.parquet")).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let batch = reader.next().unwrap().unwrap();
        let kitchen = batch.column_by_name("kitchen").unwrap();
        assert!(kitchen.is_null(0));
        let distance = batch.column_by_name("distance_m").unwrap();
        assert!(!distance.is_null(0));
    }

    #[test]
    fn observer_drives_parquet() {
        let dir = tmp();
        let mut sim = small_sim(30, 10);
        let mut obs = SnapshotObserver::new(ParquetWriter::new(dir.path()).unwrap(), sim.config());
        sim.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());
        assert_eq!(rows_in(dir.path().join("tick_summaries.parquet")), 30);
        assert_eq!(rows_in(dir.path().join("events.parquet")), sim.world().events().len());
    }
}
