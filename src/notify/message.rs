use crate::error::ProcessingError;
use crate::models::{format_nano, raw_to_display, PendingMap, Transaction};

/// One line of a notification: who sent how much
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEntry {
    pub from_account: String,
    pub amount: f64,
}

/// A rendered notification body and the total it reports
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub body: String,
    pub total: f64,
    pub entries: Vec<MessageEntry>,
}

impl Message {
    /// True when there is nothing to report
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which email template a message is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Transactions,
    Pendings,
}

impl Template {
    fn heading(self) -> &'static str {
        match self {
            Template::Transactions => "New transactions received by",
            Template::Pendings => "New pending transactions for",
        }
    }
}

/// Build the message for newly confirmed transactions; only `receive` entries count
pub fn build_transaction_message(
    account: &str,
    new_transactions: &[Transaction],
) -> Result<Message, ProcessingError> {
    let entries = new_transactions
        .iter()
        .filter(|tx| tx.is_receive())
        .map(|tx| entry(&tx.account, &tx.amount))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(assemble(Template::Transactions, account, entries))
}

/// Build the message for newly seen pending transfers
pub fn build_pending_message(
    account: &str,
    new_pending: &PendingMap,
) -> Result<Message, ProcessingError> {
    let mut entries = new_pending
        .values()
        .map(|transfer| entry(&transfer.source, &transfer.amount))
        .collect::<Result<Vec<_>, _>>()?;

    // Map order is arbitrary; keep the body stable
    entries.sort_by(|a, b| a.from_account.cmp(&b.from_account).then(a.amount.total_cmp(&b.amount)));

    Ok(assemble(Template::Pendings, account, entries))
}

fn entry(from_account: &str, raw_amount: &str) -> Result<MessageEntry, ProcessingError> {
    Ok(MessageEntry {
        from_account: from_account.to_string(),
        amount: raw_to_display(raw_amount)?,
    })
}

fn assemble(template: Template, account: &str, entries: Vec<MessageEntry>) -> Message {
    let total: f64 = entries.iter().map(|entry| entry.amount).sum();
    let body = render(template, account, &entries);
    Message { body, total, entries }
}

/// Render an HTML email body listing each entry.
///
/// The two templates are fixed in code; only the heading differs.
pub fn render(template: Template, account: &str, entries: &[MessageEntry]) -> String {
    let rows: String = entries
        .iter()
        .map(|entry| {
            format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                escape_html(&entry.from_account),
                format_nano(entry.amount)
            )
        })
        .collect();

    format!(
        "<html>\n<body>\n<p>{} <strong>{}</strong></p>\n<table>\n\
         <tr><th>From</th><th>Amount (XRB)</th></tr>\n{}</table>\n</body>\n</html>\n",
        template.heading(),
        escape_html(account),
        rows
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
