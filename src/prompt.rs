use std::io::{self, BufRead, IsTerminal, Stdout, StdinLock, Write};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::Stylize,
    terminal,
};
#[cfg(test)]
use mockall::automock;

use crate::error::TwError;

/// 対話的な入力を行うためのtrait。
///
/// 端末からの入力はこのtraitの実装に閉じ込め、他の処理は端末なしでテストできるようにする。
#[cfg_attr(test, automock)]
pub trait Prompter {
    /// 選択肢から1つを選ばせ、そのindexを返す。
    ///
    /// キャンセルされた場合は`TwError::UserAbort`を返す。
    fn select(&mut self, label: &str, items: &[String]) -> Result<usize, TwError>;

    /// 1行の入力を受け付ける。何も入力されなかった場合は`default`を返す。
    fn input(&mut self, label: &str, default: Option<String>) -> Result<String, TwError>;

    /// 入力内容を表示せずに1行の入力を受け付ける。
    fn password(&mut self, label: &str) -> Result<String, TwError>;

    /// 利用者へのメッセージを表示する。
    fn notify(&mut self, message: &str) -> Result<(), TwError>;
}

/// 端末を利用した`Prompter`。
pub struct TerminalPrompter<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    /// 端末に接続されている場合に、パスワードの非表示入力と色付けを行う
    interactive: bool,
}

impl TerminalPrompter<StdinLock<'static>, Stdout> {
    /// 標準入出力を利用する`TerminalPrompter`を返す。
    pub fn stdio() -> Self {
        let interactive = io::stdin().is_terminal();
        Self::new(io::stdin().lock(), io::stdout(), interactive)
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(reader: R, writer: W, interactive: bool) -> Self {
        Self {
            reader,
            writer,
            interactive,
        }
    }

    /// 1行読み込み、末尾の改行を取り除いて返す。入力が終端に達した場合はキャンセル扱いにする。
    fn read_line(&mut self) -> Result<String, TwError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(TwError::UserAbort);
        }

        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn select(&mut self, label: &str, items: &[String]) -> Result<usize, TwError> {
        if items.is_empty() {
            return Err(TwError::invalid_input(format!("nothing to select for: {}", label)));
        }

        writeln!(self.writer, "{}", label)?;
        for (i, item) in items.iter().enumerate() {
            writeln!(self.writer, "{:>4}) {}", i + 1, item)?;
        }

        loop {
            write!(self.writer, "Choose [1-{}] (empty to cancel): ", items.len())?;
            self.writer.flush()?;

            let answer = self.read_line()?;
            if answer.is_empty() {
                return Err(TwError::UserAbort);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(self.writer, "Invalid choice: {}", answer)?,
            }
        }
    }

    fn input(&mut self, label: &str, default: Option<String>) -> Result<String, TwError> {
        match &default {
            Some(default) if self.interactive => write!(
                self.writer,
                "{}{} ",
                label,
                format!(" (default: {}):", default).yellow()
            )?,
            Some(default) => write!(self.writer, "{} (default: {}): ", label, default)?,
            None => write!(self.writer, "{}: ", label)?,
        }
        self.writer.flush()?;

        let answer = self.read_line()?;
        match default {
            Some(default) if answer.is_empty() => Ok(default),
            _ => Ok(answer),
        }
    }

    fn password(&mut self, label: &str) -> Result<String, TwError> {
        write!(self.writer, "{}: ", label)?;
        self.writer.flush()?;

        if !self.interactive {
            return self.read_line();
        }

        terminal::enable_raw_mode()?;
        let result = read_hidden_line();
        terminal::disable_raw_mode()?;
        writeln!(self.writer)?;

        result
    }

    fn notify(&mut self, message: &str) -> Result<(), TwError> {
        writeln!(self.writer, "{}", message)?;

        Ok(())
    }
}

/// raw modeの端末からEnterが押されるまでの入力をエコーせずに読み込む。
fn read_hidden_line() -> Result<String, TwError> {
    let mut line = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read()?
        else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }

        match code {
            KeyCode::Enter => return Ok(line),
            KeyCode::Esc => return Err(TwError::UserAbort),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(TwError::UserAbort)
            }
            KeyCode::Char(c) => line.push(c),
            KeyCode::Backspace => {
                line.pop();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::{Prompter, TerminalPrompter};
    use crate::error::TwError;

    fn items() -> Vec<String> {
        vec!["Alpha".to_string(), "Alpha / Write".to_string(), "Beta".to_string()]
    }

    #[rstest]
    #[case::first("1\n", 0)]
    #[case::last("3\n", 2)]
    #[case::retry_after_invalid("9\nabc\n2\n", 1)]
    fn test_select(#[case] input: &str, #[case] expected: usize) {
        let mut output = Vec::new();
        let mut prompter = TerminalPrompter::new(Cursor::new(input), &mut output, false);

        assert_eq!(prompter.select("Select target", &items()).unwrap(), expected);
    }

    #[rstest]
    #[case::empty_line("\n")]
    #[case::eof("")]
    fn test_select_cancel(#[case] input: &str) {
        let mut output = Vec::new();
        let mut prompter = TerminalPrompter::new(Cursor::new(input), &mut output, false);

        assert!(matches!(
            prompter.select("Select target", &items()),
            Err(TwError::UserAbort)
        ));
    }

    #[test]
    fn test_select_shows_menu() {
        let mut output = Vec::new();
        let mut prompter = TerminalPrompter::new(Cursor::new("1\n"), &mut output, false);
        prompter.select("Select target", &items()).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Select target\n   1) Alpha\n   2) Alpha / Write\n   3) Beta\n"));
    }

    #[rstest]
    #[case::default_used("\n", Some("09:00"), "09:00")]
    #[case::answer_used("10:30\n", Some("09:00"), "10:30")]
    #[case::trimmed("  me@example.com \n", None, "me@example.com")]
    #[case::no_default_empty("\n", None, "")]
    fn test_input(#[case] input: &str, #[case] default: Option<&str>, #[case] expected: &str) {
        let mut output = Vec::new();
        let mut prompter = TerminalPrompter::new(Cursor::new(input), &mut output, false);

        let answer = prompter
            .input("Start time (HH:MM)", default.map(str::to_string))
            .unwrap();

        assert_eq!(answer, expected);
    }

    #[test]
    fn test_password_without_terminal() {
        let mut output = Vec::new();
        let mut prompter = TerminalPrompter::new(Cursor::new("s3cret\n"), &mut output, false);

        assert_eq!(prompter.password("Password").unwrap(), "s3cret");
        assert_eq!(String::from_utf8(output).unwrap(), "Password: ");
    }
}
