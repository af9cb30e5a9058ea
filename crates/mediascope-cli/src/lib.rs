use mediascope_core::{
    format_size, timeout_minutes, ProgressEvent, TimeoutPolicy, VideoResult, VideoSection,
};

/// Status line for an upload progress event.
pub fn progress_line(event: ProgressEvent) -> String {
    if event.percent_complete >= 100 {
        "Processing...".to_string()
    } else {
        format!("Uploading: {}%", event.percent_complete)
    }
}

/// Video output split into titled blocks, one blank line apart.
pub fn render_video(result: &VideoResult) -> String {
    let sections = result.sections();
    if sections.is_empty() {
        return "(no analysis output)".to_string();
    }

    sections
        .iter()
        .map(|section| match section {
            VideoSection::Header(title) => format!("== {} ==", title.trim_end_matches(':')),
            VideoSection::Body(text) => text.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Human summary of the deadline a video of `size_bytes` would get.
pub fn describe_estimate(size_bytes: u64, policy: &TimeoutPolicy) -> String {
    let timeout = policy.video_timeout(size_bytes);
    format!(
        "Deadline for a {} video: {} minutes ({} ms)",
        format_size(size_bytes),
        timeout_minutes(timeout),
        timeout.as_millis()
    )
}

/// Initialize tracing for CLI binaries. Logs go to stderr.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_uploading() {
        assert_eq!(
            progress_line(ProgressEvent { percent_complete: 42 }),
            "Uploading: 42%"
        );
    }

    #[test]
    fn progress_line_processing_at_completion() {
        assert_eq!(
            progress_line(ProgressEvent {
                percent_complete: 100
            }),
            "Processing..."
        );
    }

    #[test]
    fn render_video_sections() {
        let result = VideoResult {
            output: "Timeline:\n\n0:00 A dog runs.\n\nSummary:\n\nA dog plays.".to_string(),
        };
        assert_eq!(
            render_video(&result),
            "== Timeline ==\n\n0:00 A dog runs.\n\n== Summary ==\n\nA dog plays."
        );
    }

    #[test]
    fn render_video_empty() {
        let result = VideoResult {
            output: String::new(),
        };
        assert_eq!(render_video(&result), "(no analysis output)");
    }

    #[test]
    fn describe_estimate_zero_bytes() {
        assert_eq!(
            describe_estimate(0, &TimeoutPolicy::default()),
            "Deadline for a 0 Bytes video: 30 minutes (1800000 ms)"
        );
    }
}
