use dqi_engine::aggregate::AggregationLevel;
use dqi_engine::{
    DqiEngine, EngineConfig, RunReport, WeightRegistry, generate_subject_table,
    read_subject_table, read_subject_table_async, write_outputs, write_table,
};

#[test]
fn test_parquet_round_trip() -> dqi_engine::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("subjects.parquet");
    let batch = generate_subject_table(250, 13, &WeightRegistry::default())?;

    write_table(&path, &batch)?;
    let read = read_subject_table(&path)?;

    assert_eq!(read.num_rows(), batch.num_rows());
    assert_eq!(read.columns(), batch.columns());
    Ok(())
}

#[tokio::test]
async fn test_async_read_matches_sync_read() -> dqi_engine::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("subjects.parquet");
    let batch = generate_subject_table(120, 2, &WeightRegistry::default())?;
    write_table(&path, &batch)?;

    let sync = read_subject_table(&path)?;
    let async_read = read_subject_table_async(&path).await?;
    assert_eq!(sync.columns(), async_read.columns());
    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_subject_table(&dir.path().join("absent.parquet")).is_err());
}

#[test]
fn test_write_outputs() -> dqi_engine::Result<()> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("run");
    let engine = DqiEngine::new(WeightRegistry::default(), EngineConfig::default())?;
    let batch = generate_subject_table(300, 17, engine.registry())?;

    let result = engine.run(&batch)?;
    let report = RunReport::new(&engine, &result);
    let written = write_outputs(&out, &result, &report)?;
    assert_eq!(written.len(), 2 + AggregationLevel::ALL.len());

    for level in AggregationLevel::ALL {
        let path = out.join(format!("{}.parquet", level.name()));
        let table = read_subject_table(&path)?;
        assert_eq!(Some(table.num_rows()), result.level(level).map(|b| b.num_rows()));
    }

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("report.json"))?)?;
    assert_eq!(json["subject_count"], 300);
    assert_eq!(json["weights_version"], engine.registry().version.as_str());
    assert!(json["thresholds"]["subject"]["high"].as_f64().unwrap() >= 0.1);
    Ok(())
}
