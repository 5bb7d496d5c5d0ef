//! Line-oriented console over the transaction view
//!
//! Reads one command per line, forwards it to the orchestrator as an intent
//! and prints the resulting view.

use std::collections::HashMap;
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use txview_core::TransactionView;
use txview_utils::{approval_marker, employee_label, format_amount};

const HELP: &str = "\
Commands:
  all                 show all transactions (first page)
  select <employee>   show one employee's transactions (empty id = all)
  more                load the next page
  toggle <txn>        flip a transaction's approval
  show                print the current view
  employees           list employees
  help                this message
  quit                exit";

/// A user intent typed at the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    All,
    Select(String),
    More,
    Toggle(String),
    Show,
    Employees,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let name = parts.next().unwrap_or("").to_lowercase();
        let arg = parts.next().map(str::to_string);

        match (name.as_str(), arg) {
            ("all", None) => Ok(Command::All),
            ("select", id) => Ok(Command::Select(id.unwrap_or_default())),
            ("more", None) => Ok(Command::More),
            ("toggle", Some(id)) => Ok(Command::Toggle(id)),
            ("toggle", None) => Err("toggle needs a transaction id".to_string()),
            ("show", None) => Ok(Command::Show),
            ("employees", None) => Ok(Command::Employees),
            ("help", None) | ("?", None) => Ok(Command::Help),
            ("quit", None) | ("exit", None) => Ok(Command::Quit),
            ("", _) => Err("empty command".to_string()),
            (other, _) => Err(format!("unknown command: {}", other)),
        }
    }
}

/// Render the merged list with the "View More" affordance
pub fn render_transactions(view: &TransactionView) -> String {
    let names: HashMap<String, String> = view
        .employees()
        .unwrap_or_default()
        .into_iter()
        .map(|e| (e.id.clone(), employee_label(&e.first_name, &e.last_name)))
        .collect();

    let mut out = String::new();
    out.push_str(&format!("== {} ==\n", view.mode()));
    if view.is_loading() {
        out.push_str("(loading)\n");
    }

    let transactions = view.merged_transactions();
    if transactions.is_empty() {
        out.push_str("No transactions\n");
    }
    for tx in &transactions {
        let employee = names.get(&tx.employee_id).map(String::as_str).unwrap_or("?");
        let date = tx
            .date_naive()
            .map(|d| d.format("%b %d, %Y").to_string())
            .unwrap_or_else(|| tx.date.clone());
        out.push_str(&format!(
            "{} {:<8} {:<14} {:<24} {:<20} {:>12}\n",
            approval_marker(tx.approved),
            tx.id,
            date,
            tx.merchant,
            employee,
            format_amount(tx.amount)
        ));
    }

    if view.view_more_visible() {
        if view.view_more_enabled() {
            out.push_str("-- View More (type `more`) --\n");
        } else {
            out.push_str("-- View More (loading) --\n");
        }
    }
    out
}

/// Render the employee selector entries
pub fn render_employees(view: &TransactionView) -> String {
    if view.employees_loading() {
        return "Loading employees\n".to_string();
    }
    let selected = view.selected_employee_id().unwrap_or_default();
    view.employee_options()
        .iter()
        .map(|e| {
            let marker = if e.id == selected { "*" } else { " " };
            let id = if e.is_empty() { "\"\"" } else { e.id.as_str() };
            format!("{} {:<6} {}\n", marker, id, employee_label(&e.first_name, &e.last_name))
        })
        .collect()
}

/// Apply one command. Returns false when the session should end.
pub async fn execute(view: &TransactionView, command: Command, out: &mut impl Write) -> std::io::Result<bool> {
    let result = match &command {
        Command::All => view.load_all_transactions().await,
        Command::More if !view.view_more_visible() => {
            writeln!(out, "Nothing more to load in this view")?;
            Ok(())
        }
        Command::More => view.load_all_transactions().await,
        Command::Select(id) => view.load_transactions_by_employee(id).await,
        Command::Toggle(id) => {
            if !view.toggle_transaction(id) {
                writeln!(out, "No transaction {} in the current view", id)?;
            }
            Ok(())
        }
        Command::Show => Ok(()),
        Command::Employees => {
            write!(out, "{}", render_employees(view))?;
            return Ok(true);
        }
        Command::Help => {
            writeln!(out, "{}", HELP)?;
            return Ok(true);
        }
        Command::Quit => return Ok(false),
    };

    if let Err(error) = result {
        writeln!(out, "{}", error.to_details())?;
    }
    write!(out, "{}", render_transactions(view))?;
    Ok(true)
}

/// Run commands from `input` until it ends or `quit` is read
pub async fn run<R>(view: &TransactionView, input: R, out: &mut impl Write) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if !execute(view, command, out).await? {
                    break;
                }
            }
            Err(message) => writeln!(out, "{} (type `help`)", message)?,
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use txview_config::ViewConfig;
    use txview_providers::{FixtureData, ProviderSet};

    const DATA: &str = r#"{
        "employees": [
            {"id": "1", "firstName": "Ada", "lastName": "Lovelace"},
            {"id": "2", "firstName": "Alan", "lastName": "Turing"}
        ],
        "transactions": [
            {"id": "t1", "amount": "12.5", "employeeId": "1", "merchant": "Books", "date": "2024-03-01"},
            {"id": "t2", "amount": "1200", "employeeId": "2", "merchant": "Hardware", "date": "2024-03-02", "approved": true},
            {"id": "t3", "amount": "8", "employeeId": "1", "merchant": "Coffee", "date": "2024-03-03"}
        ]
    }"#;

    fn view() -> TransactionView {
        let data = FixtureData::from_json(DATA).unwrap();
        TransactionView::new(ProviderSet::in_memory(data, 2, Duration::ZERO), ViewConfig::default())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("all".parse::<Command>(), Ok(Command::All));
        assert_eq!("select 2".parse::<Command>(), Ok(Command::Select("2".into())));
        assert_eq!("select".parse::<Command>(), Ok(Command::Select(String::new())));
        assert_eq!("TOGGLE t1".parse::<Command>(), Ok(Command::Toggle("t1".into())));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
        assert!("toggle".parse::<Command>().is_err());
        assert!("fly".parse::<Command>().is_err());
        assert!("all extra".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn test_render_after_start() {
        let view = view();
        view.start().await.unwrap();

        let text = render_transactions(&view);
        assert!(text.contains("== all transactions =="));
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("$1,200.00"));
        assert!(text.contains("[x] t2"));
        assert!(text.contains("Mar 01, 2024"));
        assert!(text.contains("View More"));
        assert!(!text.contains("t3"));
    }

    #[tokio::test]
    async fn test_script_session() {
        let view = view();
        view.start().await.unwrap();
        let script = "# comment\ntoggle t1\nselect 1\nmore\nselect\nquit\nshow\n";
        let mut out = Vec::new();

        run(&view, script.as_bytes(), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("== employee 1 =="));
        assert!(text.contains("[x] t1"));
        assert!(text.contains("Nothing more to load in this view"));
        assert_eq!(view.selected_employee_id(), None);
        assert_eq!(text.matches("== all transactions ==").count(), 2);
        assert_eq!(text.matches("== employee 1 ==").count(), 2);
    }

    #[tokio::test]
    async fn test_more_loads_next_page() {
        let view = view();
        view.start().await.unwrap();
        let mut out = Vec::new();

        assert!(execute(&view, Command::More, &mut out).await.unwrap());

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("t3"));
        assert!(!text.contains("View More"));
    }

    #[tokio::test]
    async fn test_render_employees_marks_selection() {
        let view = view();
        view.start().await.unwrap();
        view.load_transactions_by_employee("2").await.unwrap();

        let text = render_employees(&view);
        assert!(text.contains("All Employees"));
        assert!(text.contains("* 2"));
    }
}
