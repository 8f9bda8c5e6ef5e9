//! Selects the transactions of a block that carry at least one RAM action.

use serde_json::Value;

/// Action names that trade RAM for tokens.
pub const RAM_ACTIONS: [&str; 4] = ["buyrambytes", "buyram", "sellrambytes", "sellram"];

fn has_ram_action(actions: &[Value]) -> bool {
    actions.iter().any(|action| {
        action
            .get("name")
            .and_then(|n| n.as_str())
            .map(|name| RAM_ACTIONS.contains(&name))
            .unwrap_or(false)
    })
}

/// Ids of executed transactions in `block` containing at least one RAM
/// action, in block order. Transactions with a non-executed status, a
/// missing body (deferred transactions carry a bare id string as `trx`), or
/// no top-level actions are never selected.
pub fn ram_transaction_ids(block: &Value) -> Vec<String> {
    let transactions = match block.get("transactions").and_then(|t| t.as_array()) {
        Some(transactions) => transactions,
        None => return Vec::new(),
    };
    let mut ids = Vec::new();
    for transaction in transactions {
        if transaction.get("status").and_then(|s| s.as_str()) != Some("executed") {
            continue;
        }
        let trx = match transaction.get("trx") {
            Some(trx) => trx,
            None => continue,
        };
        let actions = match trx
            .get("transaction")
            .and_then(|t| t.get("actions"))
            .and_then(|a| a.as_array())
        {
            Some(actions) if !actions.is_empty() => actions,
            _ => continue,
        };
        if !has_ram_action(actions) {
            continue;
        }
        if let Some(id) = trx.get("id").and_then(|i| i.as_str()) {
            ids.push(id.to_string());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tx(status: &str, id: &str, names: &[&str]) -> Value {
        json!({
            "status": status,
            "trx": {
                "id": id,
                "transaction": {
                    "actions": names
                        .iter()
                        .map(|name| json!({"account": "eosio", "name": name}))
                        .collect::<Vec<_>>(),
                }
            }
        })
    }

    #[test]
    fn selects_executed_ram_transactions_in_order() {
        let block = json!({
            "transactions": [
                tx("executed", "aaa", &["buyram"]),
                tx("executed", "bbb", &["transfer"]),
                tx("executed", "ccc", &["transfer", "sellram"]),
            ]
        });
        assert_eq!(ram_transaction_ids(&block), vec!["aaa", "ccc"]);
    }

    #[test]
    fn skips_failed_status() {
        let block = json!({ "transactions": [tx("hard_fail", "aaa", &["buyram"])] });
        assert!(ram_transaction_ids(&block).is_empty());
    }

    #[test]
    fn skips_empty_action_list() {
        let block = json!({ "transactions": [tx("executed", "aaa", &[])] });
        assert!(ram_transaction_ids(&block).is_empty());
    }

    #[test]
    fn skips_deferred_trx_without_body() {
        // Deferred transactions show up with a bare id string as trx.
        let block = json!({ "transactions": [{"status": "executed", "trx": "aaa"}] });
        assert!(ram_transaction_ids(&block).is_empty());
    }

    #[test]
    fn empty_block_yields_nothing() {
        assert!(ram_transaction_ids(&json!({"transactions": []})).is_empty());
        assert!(ram_transaction_ids(&json!({})).is_empty());
    }
}
