use garmin_connect_client::{GarminApi, config::Config, http_client::ReqwestGarminClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::from_env()?;
    let client = ReqwestGarminClient::new(&cfg.base_url, cfg.email.clone(), cfg.password);

    let limit = std::env::var("GARMIN_LIMIT")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(10);

    client.login().await?;
    let activities = client
        .get_activities(0, limit)
        .await
        .map_err(|e| format!("failed to fetch activities: {}", e))?;

    if activities.is_empty() {
        println!("No activities returned (check credentials or account)");
        return Ok(());
    }

    println!("Latest activities (limit {}):", limit);
    for a in activities {
        let name = a.activity_name.clone().unwrap_or_else(|| "(no name)".to_string());
        println!(
            "- {} [{}] {:.1} km — {}",
            a.activity_id,
            a.sport(),
            a.distance / 1000.0,
            name
        );
    }

    Ok(())
}
