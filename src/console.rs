use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Weekday};
use crossterm::style::Stylize;

use crate::log_command::LogOutcome;
use crate::models::{ProfilePerson, Project, TasksGroup};
use crate::report::MonthlyReport;

/// コマンドの結果をConsoleに表示するためのtrait。
pub trait ConsolePresenter {
    /// ログイン中のユーザー情報を表示する。
    fn show_profile(&mut self, person: &ProfilePerson) -> Result<()>;

    fn show_projects(&mut self, projects: &[Project]) -> Result<()>;

    /// プロジェクトごとにまとめたタスクを表示する。
    fn show_task_groups(&mut self, groups: &[TasksGroup]) -> Result<()>;

    /// 時間記録の内容を表示する。
    fn show_log_outcome(&mut self, outcome: &LogOutcome) -> Result<()>;

    /// 月毎の集計結果を表形式で表示する。
    ///
    /// # Arguments
    ///
    /// * `report` - 表示する集計結果
    fn show_report(&mut self, report: &MonthlyReport) -> Result<()>;
}

/// コマンドの結果をテキストで表示する。
pub struct ConsoleText<'a, W: Write> {
    writer: &'a mut W,
    /// 土日を色付けするかどうか
    colored: bool,
}

impl<'a, W: Write> ConsoleText<'a, W> {
    /// 新しい`ConsoleText`を返す。
    pub fn new(writer: &'a mut W, colored: bool) -> Self {
        Self { writer, colored }
    }

    /// 表の区切り線を出力する。
    fn write_border(&mut self, widths: &[usize]) -> Result<()> {
        let line = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+");
        writeln!(self.writer, "+{}+", line).context("Failed to write table border")
    }

    fn write_row(&mut self, cells: &[String]) -> Result<()> {
        writeln!(self.writer, "| {} |", cells.join(" | ")).context("Failed to write table row")
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleText<'a, W> {
    fn show_profile(&mut self, person: &ProfilePerson) -> Result<()> {
        let lines = [
            ("ID         ", &person.id),
            ("First Name ", &person.first_name),
            ("Last Name  ", &person.last_name),
            ("Email      ", &person.email_address),
            ("Company    ", &person.company_name),
        ];
        for (label, value) in lines {
            writeln!(self.writer, "{}: {}", label, value)
                .with_context(|| format!("Failed to write profile field: {}", label.trim()))?;
        }

        Ok(())
    }

    fn show_projects(&mut self, projects: &[Project]) -> Result<()> {
        for project in projects {
            writeln!(self.writer, "[ID: {}] {}", project.id, project.name)
                .with_context(|| format!("Failed to write project: {:?}", project))?;
        }

        Ok(())
    }

    fn show_task_groups(&mut self, groups: &[TasksGroup]) -> Result<()> {
        for group in groups {
            writeln!(
                self.writer,
                "[ProjectID: {}] {}",
                group.project.id, group.project.name
            )
            .with_context(|| format!("Failed to write project: {:?}", group.project))?;
            for task in &group.tasks {
                writeln!(self.writer, "  [ID: {}] {}", task.id, task.content)
                    .with_context(|| format!("Failed to write task: {:?}", task))?;
            }
        }

        Ok(())
    }

    fn show_log_outcome(&mut self, outcome: &LogOutcome) -> Result<()> {
        let status = if outcome.dry_run {
            "Dry run, not logging anything"
        } else {
            "Time logged"
        };
        write!(
            self.writer,
            "Target: {}\nDuration: {:.2}\nStart time: {}\nDate: {}\n{}\n",
            outcome.target,
            outcome.duration.num_minutes() as f64 / 60.0,
            outcome.start_time.format("%H:%M:%S"),
            outcome.date.format("%Y-%m-%d"),
            status
        )
        .with_context(|| format!("Failed to write log outcome: {:?}", outcome))
    }

    fn show_report(&mut self, report: &MonthlyReport) -> Result<()> {
        writeln!(
            self.writer,
            "Logged time for {}",
            report.month_start.format("%Y-%m")
        )
        .context("Failed to write report title")?;

        let header = ["Date", "Billable", "Non-Billable"].map(String::from);
        let rows: Vec<[String; 3]> = report
            .days
            .iter()
            .map(|day| {
                [
                    day.date.format("%Y-%m-%d").to_string(),
                    format_nonzero(day.billable),
                    format_nonzero(day.non_billable),
                ]
            })
            .collect();
        let footer = [
            "Total".to_string(),
            format_duration(report.total_billable),
            format_duration(report.total_non_billable),
        ];

        let mut widths = header.clone().map(|h| h.len());
        for row in rows.iter().chain(std::iter::once(&footer)) {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        self.write_border(&widths)?;
        let centered: Vec<String> = header
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:^w$}", h, w = *w))
            .collect();
        self.write_row(&centered)?;
        self.write_border(&widths)?;

        for (day, row) in report.days.iter().zip(&rows) {
            let mut cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:>w$}", c, w = *w))
                .collect();
            if self.colored && matches!(day.date.weekday(), Weekday::Sat | Weekday::Sun) {
                cells[0] = cells[0].clone().red().to_string();
            }
            self.write_row(&cells)?;
        }

        self.write_border(&widths)?;
        let footer: Vec<String> = footer
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:>w$}", c, w = *w))
            .collect();
        self.write_row(&footer)?;
        self.write_border(&widths)?;

        Ok(())
    }
}

/// 時間を`時:分`の形式で表す。
pub fn format_duration(d: Duration) -> String {
    format!("{:2}:{:02}", d.num_hours(), d.num_minutes() % 60)
}

/// 0の場合は空文字にする。
fn format_nonzero(d: Duration) -> String {
    if d.is_zero() {
        String::new()
    } else {
        format_duration(d)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;

    use super::{format_duration, ConsolePresenter, ConsoleText};
    use crate::log_command::LogOutcome;
    use crate::models::{ProfilePerson, ProjectsResponse, TasksResponse};
    use crate::report::build_report;
    use crate::selector::TimelogTarget;
    use crate::time_entry::TimeEntry;

    #[rstest]
    #[case(Duration::zero(), " 0:00")]
    #[case(Duration::minutes(480), " 8:00")]
    #[case(Duration::minutes(95), " 1:35")]
    #[case(Duration::minutes(10_000), "166:40")]
    fn test_format_duration(#[case] input: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(input), expected);
    }

    #[test]
    fn test_show_profile() {
        let person = ProfilePerson {
            id: "42".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email_address: "jane@example.com".to_string(),
            company_name: "Acme".to_string(),
        };
        let mut writer = Vec::new();
        ConsoleText::new(&mut writer, false)
            .show_profile(&person)
            .unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            "ID         : 42\nFirst Name : Jane\nLast Name  : Doe\nEmail      : jane@example.com\nCompany    : Acme\n"
        );
    }

    #[test]
    fn test_show_projects_and_tasks() {
        let projects: ProjectsResponse = serde_json::from_value(json!({
            "projects": [{"id": "10", "name": "Alpha"}]
        }))
        .unwrap();
        let tasks: TasksResponse = serde_json::from_value(json!({
            "todo-items": [{"id": 1, "content": "Write", "project-id": 10, "project-name": "Alpha"}]
        }))
        .unwrap();

        let mut writer = Vec::new();
        let mut presenter = ConsoleText::new(&mut writer, false);
        presenter.show_projects(&projects.projects).unwrap();
        presenter
            .show_task_groups(&tasks.group_by_project())
            .unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            "[ID: 10] Alpha\n[ProjectID: 10] Alpha\n  [ID: 1] Write\n"
        );
    }

    #[rstest]
    #[case::dry_run(true, "Dry run, not logging anything\n")]
    #[case::logged(false, "Time logged\n")]
    fn test_show_log_outcome(#[case] dry_run: bool, #[case] last_line: &str) {
        let outcome = LogOutcome {
            target: TimelogTarget::from_ids(Some(5), Some(7)),
            duration: Duration::minutes(90),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
            description: String::new(),
            billable: true,
            dry_run,
        };
        let mut writer = Vec::new();
        ConsoleText::new(&mut writer, false)
            .show_log_outcome(&outcome)
            .unwrap();

        let expected = format!(
            "Target: [5:7]\nDuration: 1.50\nStart time: 09:00:00\nDate: 2024-02-05\n{}",
            last_line
        );
        assert_eq!(String::from_utf8(writer).unwrap(), expected);
    }

    /// 書き込みに失敗し続ける出力先。
    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// 書き込みに失敗した場合は、何を書こうとしていたかが分かるエラーになることを確認する。
    #[test]
    fn test_write_error_has_context() {
        let mut writer = BrokenWriter;
        let mut presenter = ConsoleText::new(&mut writer, false);

        let person = ProfilePerson {
            id: "42".to_string(),
            ..Default::default()
        };
        let err = presenter.show_profile(&person).unwrap_err();
        assert_eq!(err.to_string(), "Failed to write profile field: ID");

        let tasks: TasksResponse = serde_json::from_value(json!({
            "todo-items": [{"id": 1, "content": "Write", "project-id": 10, "project-name": "Alpha"}]
        }))
        .unwrap();
        let err = presenter
            .show_task_groups(&tasks.group_by_project())
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to write project"));
        assert_eq!(
            err.root_cause().downcast_ref::<io::Error>().map(io::Error::kind),
            Some(io::ErrorKind::BrokenPipe)
        );
    }

    #[test]
    fn test_show_report() {
        let report = build_report(
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            &[TimeEntry {
                epoch: Utc.with_ymd_and_hms(2024, 2, 5, 0, 0, 0).unwrap(),
                hours: 8.0,
                minutes: 480,
            }],
            &[],
        )
        .unwrap();

        let mut writer = Vec::new();
        ConsoleText::new(&mut writer, false)
            .show_report(&report)
            .unwrap();
        let output = String::from_utf8(writer).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "Logged time for 2024-02");
        assert_eq!(lines[1], "+------------+----------+--------------+");
        assert_eq!(lines[2], "|    Date    | Billable | Non-Billable |");
        assert_eq!(lines[4], "| 2024-02-01 |          |              |");
        assert_eq!(lines[8], "| 2024-02-05 |     8:00 |              |");
        assert_eq!(lines[lines.len() - 2], "|      Total |     8:00 |         0:00 |");
        // 見出し、29日分、合計、区切り線
        assert_eq!(lines.len(), 1 + 3 + 29 + 3);
    }

    /// 色付けした場合は土日の日付だけに制御文字が入ることを確認する。
    #[test]
    fn test_show_report_colored_weekend() {
        let report = build_report(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(), &[], &[])
            .unwrap();

        let mut writer = Vec::new();
        ConsoleText::new(&mut writer, true)
            .show_report(&report)
            .unwrap();
        let output = String::from_utf8(writer).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        // 2024-02-03は土曜日、2024-02-05は月曜日
        assert!(lines[6].contains('\u{1b}'));
        assert!(!lines[8].contains('\u{1b}'));
    }
}
