use batchgate_config::{config, configure};
use batchgate_gateway::GatewayClient;
use batchgate_result::{create_error, Result};
use log::{error, info};

/// Split `a,b,c` into a key-set, ignoring blank entries
fn parse_key_set(argument: &str) -> Vec<String> {
    argument
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    configure!(probe);

    let settings = config().await?;
    let client = GatewayClient::from_settings(&settings)?;

    let endpoint = settings.gateway.endpoints.first().cloned().ok_or_else(|| {
        create_error!(InvalidConfiguration {
            error: "no coalesced endpoints configured".to_string()
        })
    })?;

    let key_sets: Vec<Vec<String>> = std::env::args()
        .skip(1)
        .map(|arg| parse_key_set(&arg))
        .collect();
    info!("Issuing {} lookups against {endpoint}", key_sets.len());

    // All lookups are started before any of them is awaited so they share a window
    let tasks: Vec<_> = key_sets
        .into_iter()
        .map(|ids| {
            let client = client.clone();
            let endpoint = endpoint.clone();

            tokio::spawn(async move {
                let outcome = client.get(endpoint).ids(ids.clone()).send().await;
                (ids, outcome)
            })
        })
        .collect();

    for task in tasks {
        let (ids, outcome) = task.await.map_err(|_| create_error!(InternalError))?;

        match outcome {
            Ok(body) => println!("{} => {body}", ids.join(",")),
            Err(err) => error!("{} => {err}", ids.join(",")),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_key_set;

    #[test]
    fn splits_key_sets() {
        assert_eq!(parse_key_set("fileid1,fileid2"), vec!["fileid1", "fileid2"]);
        assert_eq!(parse_key_set(" fileid3 ,, "), vec!["fileid3"]);
        assert!(parse_key_set("").is_empty());
    }
}
