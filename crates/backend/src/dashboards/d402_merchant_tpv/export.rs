use contracts::dashboards::d402_merchant_tpv::MerchantTpvRow;

pub const EXPORT_FILE_NAME: &str = "tpv_report.csv";
pub const EXPORT_HEADERS: [&str; 2] = ["MID", "Formatted TPV"];

/// CSV для скачивания: MID и отформатированная сумма, без индекса
pub fn to_csv(rows: &[MerchantTpvRow]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;
    for row in rows {
        writer.write_record([row.mid.as_str(), row.formatted_tpv.as_str()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}
