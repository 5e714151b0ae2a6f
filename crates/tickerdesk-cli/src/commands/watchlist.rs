use std::collections::BTreeMap;

use serde::Serialize;
use tickerdesk_core::{ListKind, Ticker};

use crate::cli::{WatchlistArgs, WatchlistCommand};
use crate::error::CliError;

use super::{CommandResult, Session};

const NOT_PERSISTED: &str =
    "no list store endpoint configured; changes last only for this process (set TICKERDESK_LIST_ENDPOINT)";

#[derive(Debug, Serialize)]
struct ListsData {
    lists: BTreeMap<&'static str, Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ChangeData {
    action: &'static str,
    list: ListKind,
    ticker: Ticker,
}

pub async fn run(args: &WatchlistArgs, session: &Session) -> Result<CommandResult, CliError> {
    let dashboard = &session.dashboard;

    let result = match &args.command {
        WatchlistCommand::List { list } => {
            let kinds = match list {
                Some(list) => vec![ListKind::from(*list)],
                None => ListKind::ALL.to_vec(),
            };
            let mut lists = BTreeMap::new();
            for kind in kinds {
                lists.insert(kind.as_str(), dashboard.watchlist().entries(kind).await);
            }
            CommandResult::ok(serde_json::to_value(ListsData { lists })?)
        }
        WatchlistCommand::Add { list, ticker } => {
            let list = ListKind::from(*list);
            let ticker = dashboard.add_to_list(list, ticker).await?;
            CommandResult::ok(serde_json::to_value(ChangeData {
                action: "add",
                list,
                ticker,
            })?)
        }
        WatchlistCommand::Remove { list, ticker } => {
            let list = ListKind::from(*list);
            let ticker = dashboard.remove_from_list(list, ticker).await?;
            CommandResult::ok(serde_json::to_value(ChangeData {
                action: "remove",
                list,
                ticker,
            })?)
        }
    };

    let mutating = !matches!(args.command, WatchlistCommand::List { .. });
    if mutating && !session.lists_persisted {
        return Ok(result.with_warning(NOT_PERSISTED));
    }
    Ok(result)
}
