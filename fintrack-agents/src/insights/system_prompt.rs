use shared_types::{FinancialSnapshot, Goal, Transaction};

/// Number of transactions included in the prompt, taken in caller order
pub const MAX_PROMPT_TRANSACTIONS: usize = 10;

pub const SYSTEM_PROMPT: &str = "You are a helpful financial advisor AI. Analyze the user's financial data and provide personalized, actionable insights. Be encouraging but honest about areas that need improvement. Always respond with valid JSON.";

const OUTPUT_CONTRACT: &str = r#"Provide 3-5 personalized insights based on this data. Focus on spending patterns, savings progress, goal achievement and practical next steps.

Respond with a JSON object in exactly this format:
{
  "insights": [
    {
      "id": "unique-id",
      "type": "tip" | "warning" | "success" | "info",
      "title": "Short title",
      "description": "Detailed explanation with specific numbers from the data",
      "category": "spending" | "savings" | "goals" | "general",
      "actionLabel": "Optional action button text",
      "actionUrl": "Optional app path, e.g. /transactions or /goals"
    }
  ],
  "summary": "A brief 1-2 sentence overview of the user's financial health"
}

Rules:
- "type" must be one of: tip, warning, success, info
- "category" must be one of: spending, savings, goals, general
- Every insight must have a unique "id"
- Do not include any text outside the JSON object"#;

/// Build the user prompt for an insights request.
///
/// Pure function of the snapshot: goals are listed in full, transactions are
/// cut to the first [`MAX_PROMPT_TRANSACTIONS`] in the order given.
pub fn build_user_prompt(snapshot: &FinancialSnapshot) -> String {
    let totals = &snapshot.totals;

    format!(
        r#"Analyze the following financial data and provide personalized insights:

## Financial Summary
- Total Income: ${}
- Total Expenses: ${}
- Net Savings: ${}

## Savings Goals
{}

## Recent Transactions (last {})
{}

{}"#,
        totals.income,
        totals.expenses,
        totals.savings,
        format_goals(&snapshot.goals),
        MAX_PROMPT_TRANSACTIONS,
        format_transactions(&snapshot.transactions),
        OUTPUT_CONTRACT
    )
}

fn format_goals(goals: &[Goal]) -> String {
    if goals.is_empty() {
        return "No goals set".to_string();
    }

    goals
        .iter()
        .map(|goal| {
            format!(
                "- {}: Target ${}, Current ${}, Status: {}",
                goal.name, goal.target_amount, goal.current_amount, goal.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_transactions(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "No transactions yet".to_string();
    }

    transactions
        .iter()
        .take(MAX_PROMPT_TRANSACTIONS)
        .map(|tx| {
            let description = tx
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or("No description");
            format!(
                "- {}: {} (${}) - {}",
                tx.date, description, tx.amount, tx.transaction_type
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
