use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub date: String,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub receipt_number: String,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income.as_str()
    }
}

/// Income/expense totals and a per-date series, ascending by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinanceSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub net_balance: f64,
    pub series: Vec<DailyTotals>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotals {
    pub date: String,
    pub income: f64,
    pub expense: f64,
}

pub fn summarize(transactions: &[Transaction]) -> FinanceSummary {
    let mut summary = FinanceSummary::default();
    let mut by_date: std::collections::BTreeMap<&str, (f64, f64)> = std::collections::BTreeMap::new();

    for t in transactions {
        let entry = by_date.entry(t.date.as_str()).or_insert((0.0, 0.0));
        if t.is_income() {
            summary.total_income += t.amount;
            entry.0 += t.amount;
        } else {
            summary.total_expense += t.amount;
            entry.1 += t.amount;
        }
    }

    summary.net_balance = summary.total_income - summary.total_expense;
    summary.series = by_date
        .into_iter()
        .map(|(date, (income, expense))| DailyTotals { date: date.to_string(), income, expense })
        .collect();
    summary
}
