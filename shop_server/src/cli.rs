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
    // Be explicit about which envars to print, so that secrets are never exposed
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "SHOP_HOST",
        "SHOP_PORT",
        "SHOP_DATABASE_URL",
        "SHOP_JWT_EXPIRY_HOURS",
        "SHOP_PAYSTACK_BASE_URL",
        "SHOP_PAYSTACK_CURRENCY",
        "SHOP_PAYSTACK_CALLBACK_URL",
        "SHOP_PAYSTACK_HMAC_CHECKS",
        "SHOP_STORE_NAME",
        "SHOP_MAIL_FROM",
        "SHOP_UNPAID_ORDER_TIMEOUT",
        "SHOP_ABANDONED_CART_TIMEOUT",
        "SHOP_BOOTSTRAP_ADMIN_USERNAME",
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
