//! Command execution.

use crate::Commands;
use colored::Colorize;
use orientwire_client::{Client, ClusterInfo};
use orientwire_protocol::{Record, RecordBatch, RecordId};
use serde::Serialize;
use serde_json::json;

/// Executes a command on an authenticated client and returns the formatted
/// output.
pub async fn execute(
    client: &Client,
    cmd: Commands,
    as_json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Connect => {
            let session_id = client.connect_server().await?;
            if as_json {
                return to_json(&json!({ "session_id": session_id }));
            }
            Ok(format!("{} (session {})", "Connected".green(), session_id))
        }

        Commands::Shutdown => {
            client.shutdown_server().await?;
            if as_json {
                return to_json(&json!({ "shutdown": true }));
            }
            Ok("Server shutting down".yellow().to_string())
        }

        Commands::DbExist { name } => {
            let exists = client.database_exists(&name).await?;
            if as_json {
                return to_json(&json!({ "database": name, "exists": exists }));
            }
            if exists {
                Ok(format!("{} {}", "Exists".green(), name.cyan()))
            } else {
                Ok(format!("{} {}", "Not found".yellow(), name.cyan()))
            }
        }

        Commands::DbCreate {
            name,
            database_type,
            storage,
        } => {
            client
                .create_database(&name, database_type.as_deref(), storage.as_deref())
                .await?;
            if as_json {
                return to_json(&json!({ "database": name, "created": true }));
            }
            Ok(format!("{} database {}", "Created".green(), name.cyan()))
        }

        Commands::DbDrop { name } => {
            client.drop_database(&name).await?;
            if as_json {
                return to_json(&json!({ "database": name, "dropped": true }));
            }
            Ok(format!("{} database {}", "Dropped".green(), name.cyan()))
        }

        Commands::DbSize => {
            let size = client.database_size().await?;
            if as_json {
                return to_json(&json!({ "size": size }));
            }
            Ok(format!("Size: {} bytes", size.to_string().cyan()))
        }

        Commands::DbCount => {
            let count = client.count_records().await?;
            if as_json {
                return to_json(&json!({ "count": count }));
            }
            Ok(format!("Records: {}", count.to_string().cyan()))
        }

        Commands::DbReload => {
            let clusters = client.reload_database().await?;
            if as_json {
                return to_json(&clusters);
            }
            Ok(format_clusters(&clusters))
        }

        Commands::ClusterAdd {
            name,
            cluster_type,
            location,
            segment,
        } => {
            let id = client
                .add_cluster(
                    &name,
                    cluster_type.as_deref(),
                    location.as_deref(),
                    segment.as_deref(),
                )
                .await?;
            if as_json {
                return to_json(&json!({ "cluster": name, "id": id }));
            }
            Ok(format!("{} cluster {} (id {})", "Added".green(), name.cyan(), id))
        }

        Commands::ClusterDrop { id } => {
            let delete_local = client.drop_cluster(id).await?;
            if as_json {
                return to_json(&json!({ "id": id, "delete_on_clientside": delete_local }));
            }
            Ok(format!("{} cluster {}", "Dropped".green(), id))
        }

        Commands::ClusterCount { ids } => {
            let count = client.cluster_record_count(&ids).await?;
            if as_json {
                return to_json(&json!({ "clusters": ids, "count": count }));
            }
            Ok(format!("Records: {}", count.to_string().cyan()))
        }

        Commands::ClusterRange { id } => {
            let range = client.cluster_data_range(id).await?;
            if as_json {
                return to_json(&range);
            }
            Ok(format!("Cluster {}: {} .. {}", id, range.begin, range.end))
        }

        Commands::SegmentAdd { name, location } => {
            let id = client.add_datasegment(&name, location.as_deref()).await?;
            if as_json {
                return to_json(&json!({ "segment": name, "id": id }));
            }
            Ok(format!("{} segment {} (id {})", "Added".green(), name.cyan(), id))
        }

        Commands::SegmentDrop { name } => {
            let dropped = client.drop_datasegment(&name).await?;
            if as_json {
                return to_json(&json!({ "segment": name, "dropped": dropped }));
            }
            if dropped {
                Ok(format!("{} segment {}", "Dropped".green(), name.cyan()))
            } else {
                Ok(format!("{} segment {}", "Not dropped".yellow(), name.cyan()))
            }
        }

        Commands::RecordLoad {
            rid,
            fetch_plan,
            ignore_cache,
        } => {
            let batch = client.load_record(rid, &fetch_plan, ignore_cache).await?;
            if as_json {
                return to_json(&batch);
            }
            Ok(format_batch(rid, &batch))
        }
    }
}

/// Parses `#5:42` or `5:42`.
pub fn parse_rid(s: &str) -> Result<RecordId, String> {
    let body = s.strip_prefix('#').unwrap_or(s);
    let (cluster, position) = body
        .split_once(':')
        .ok_or_else(|| format!("invalid record id '{}': expected #cluster:position", s))?;
    let cluster_id = cluster
        .parse()
        .map_err(|e| format!("invalid cluster id '{}': {}", cluster, e))?;
    let cluster_position = position
        .parse()
        .map_err(|e| format!("invalid cluster position '{}': {}", position, e))?;
    Ok(RecordId::new(cluster_id, cluster_position))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, Box<dyn std::error::Error>> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn or_absent(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn format_clusters(clusters: &[ClusterInfo]) -> String {
    if clusters.is_empty() {
        return "No clusters".yellow().to_string();
    }

    let mut output = format!("{}\n", format!("{} cluster(s)", clusters.len()).bold());
    for cluster in clusters {
        output.push_str(&format!(
            "  {:>4}  {} [{}] segment {}\n",
            cluster.id,
            or_absent(cluster.name.as_deref()).cyan(),
            or_absent(cluster.cluster_type.as_deref()),
            cluster.datasegment_id
        ));
    }
    output.trim_end().to_string()
}

fn format_batch(rid: RecordId, batch: &RecordBatch) -> String {
    if batch.records.is_empty() {
        return format!("{} {}", "Not found".yellow(), rid);
    }

    let mut output = String::new();
    for record in &batch.records {
        output.push_str(&format!(
            "{} {} v{} class '{}' ({} bytes)\n",
            "Record".bold(),
            rid.to_string().cyan(),
            record.version,
            record.record_class as u8 as char,
            record.content.as_ref().map_or(0, |c| c.len())
        ));
        if let Some(content) = &record.content {
            output.push_str(&format!("  {}\n", String::from_utf8_lossy(content)));
        }
    }

    for record in &batch.prefetched {
        let line = match record {
            Record::Full {
                rid,
                version,
                content,
                ..
            } => format!(
                "  prefetched {} v{} ({} bytes)",
                rid,
                version,
                content.as_ref().map_or(0, |c| c.len())
            ),
            Record::RemoteLink { rid } => format!("  link {}", rid),
            Record::Null => "  null".to_string(),
        };
        output.push_str(&line.dimmed().to_string());
        output.push('\n');
    }
    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use orientwire_protocol::FetchedRecord;

    #[test]
    fn test_parse_rid() {
        assert_eq!(parse_rid("#5:42").unwrap(), RecordId::new(5, 42));
        assert_eq!(parse_rid("12:0").unwrap(), RecordId::new(12, 0));
        assert!(parse_rid("5-42").is_err());
        assert!(parse_rid("#x:1").is_err());
        assert!(parse_rid("#70000:1").is_err());
    }

    #[test]
    fn test_format_batch() {
        colored::control::set_override(false);
        let batch = RecordBatch {
            records: vec![FetchedRecord {
                content: Some(Bytes::from_static(b"Person@name:\"Ada\"")),
                version: 2,
                record_class: b'd' as i8,
            }],
            prefetched: vec![Record::RemoteLink {
                rid: RecordId::new(9, 1),
            }],
        };

        let output = format_batch(RecordId::new(5, 42), &batch);
        assert!(output.contains("#5:42 v2 class 'd' (17 bytes)"));
        assert!(output.contains("link #9:1"));
    }

    #[test]
    fn test_format_empty() {
        colored::control::set_override(false);
        assert!(format_batch(RecordId::new(1, 1), &RecordBatch::default()).contains("#1:1"));
        assert_eq!(format_clusters(&[]), "No clusters");
    }
}
