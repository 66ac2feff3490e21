use boardsel_types::FailedJobsReport;

/// Split a CI check-run name into its job key and, when present, the board it built.
///
/// `build-arm (feather_m4_express)` yields `("build-arm", Some("feather_m4_express"))`.
/// Names not starting with a `build-` job token yield `None`.
pub fn parse_check_run(name: &str) -> Option<(&str, Option<&str>)> {
    let job = name.split(' ').next()?;
    if job.len() <= boardsel_types::jobs::BUILD_PREFIX.len()
        || !job.starts_with(boardsel_types::jobs::BUILD_PREFIX)
    {
        return None;
    }

    let last = name.rsplit(' ').next().unwrap_or(name);
    let board = last
        .find('(')
        .map(|i| &last[i..])
        .filter(|s| s.len() > 2 && s.ends_with(')'))
        .map(|s| &s[1..s.len() - 1]);

    Some((job, board))
}

/// Build a failed-job report from the names of failed or incomplete check runs.
pub fn collect_failed_jobs<'a>(names: impl IntoIterator<Item = &'a str>) -> FailedJobsReport {
    let mut report = FailedJobsReport::new();
    for name in names {
        if let Some((job, board)) = parse_check_run(name) {
            report.record(job, board);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardsel_types::Architecture;

    #[test]
    fn parses_job_and_board() {
        assert_eq!(
            parse_check_run("build-arm (feather_m4_express)"),
            Some(("build-arm", Some("feather_m4_express")))
        );
        assert_eq!(parse_check_run("build-doc"), Some(("build-doc", None)));
        assert_eq!(parse_check_run("build-arm ()"), Some(("build-arm", None)));
        assert_eq!(parse_check_run("test (ubuntu)"), None);
        assert_eq!(parse_check_run("build-"), None);
    }

    #[test]
    fn collects_boards_per_job() {
        let report = collect_failed_jobs([
            "build-arm (pyportal)",
            "build-arm (pygamer)",
            "build-espressif (adafruit_feather_esp32s3)",
            "build-doc",
            "mpy-cross",
        ]);

        assert_eq!(
            report.boards_for(Architecture::Arm),
            ["pyportal".to_string(), "pygamer".to_string()]
        );
        assert_eq!(report.boards_for(Architecture::Espressif).len(), 1);
        assert!(report.docs_failed());
        assert_eq!(report.jobs().count(), 3);
    }
}
