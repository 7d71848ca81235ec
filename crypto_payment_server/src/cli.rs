use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 20] = [
        "RUST_LOG",
        "CPG_HOST",
        "CPG_PORT",
        "CPG_DATABASE_URL",
        "CPG_ENABLED_CURRENCIES",
        "CPG_BTC_ADDRESS",
        "CPG_ETH_ADDRESS",
        "CPG_USDT_ADDRESS",
        "CPG_BCH_ADDRESS",
        "CPG_LTC_ADDRESS",
        "CPG_BTC_EXPLORER_URL",
        "CPG_ETH_EXPLORER_URL",
        "CPG_USDT_EXPLORER_URL",
        "CPG_BCH_EXPLORER_URL",
        "CPG_LTC_EXPLORER_URL",
        "CPG_QUOTE_API_URL",
        "CPG_EXPLORER_TIMEOUT_SECS",
        "CPG_SWEEP_INTERVAL_SECS",
        "CPG_SWEEP_CONCURRENCY",
        "CPG_HMAC_CHECKS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
