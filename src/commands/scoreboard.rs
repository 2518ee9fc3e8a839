use crate::error::AppError;
use crate::grading::ScoreboardEntry;
use crate::AppState;

pub async fn scoreboard(state: &AppState) -> Result<Vec<ScoreboardEntry>, AppError> {
    let entries = state.api.scoreboard(&state.config.page.launch_id).await?;
    tracing::debug!(rows = entries.len(), "Scoreboard fetched");
    for line in format_rows(&entries) {
        println!("{line}");
    }
    Ok(entries)
}

fn format_rows(entries: &[ScoreboardEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| {
            let name = e.name.as_deref().unwrap_or("Unknown");
            match e.time {
                Some(t) => format!("{name}\t{}\t{t}", e.score),
                None => format!("{name}\t{}\t-", e.score),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rows() {
        let rows = format_rows(&[
            ScoreboardEntry {
                score: 66.0,
                time: Some(12.0),
                name: Some("Ada".into()),
            },
            ScoreboardEntry {
                score: 100.0,
                time: None,
                name: None,
            },
        ]);
        assert_eq!(rows, ["Ada\t66\t12", "Unknown\t100\t-"]);
    }
}
