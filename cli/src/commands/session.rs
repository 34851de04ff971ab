use anyhow::Result;

use crate::Service;

pub(crate) fn cmd_login(service: &Service, user_id: &str, json: bool) -> Result<()> {
    service.sign_in(user_id)?;
    let user_id = service.current_user()?.unwrap_or_default();

    if json {
        println!("{}", serde_json::json!({ "user_id": user_id }));
    } else {
        println!("Signed in as {user_id}");
    }

    Ok(())
}

pub(crate) fn cmd_logout(service: &Service, json: bool) -> Result<()> {
    let previous = service.current_user()?;
    service.sign_out()?;

    if json {
        println!("{}", serde_json::json!({ "signed_out": previous }));
    } else if let Some(user_id) = previous {
        println!("Signed out {user_id}");
    } else {
        eprintln!("Nobody was signed in");
    }

    Ok(())
}

pub(crate) fn cmd_whoami(service: &Service, json: bool) -> Result<()> {
    let user = service.current_user()?;

    if json {
        println!("{}", serde_json::json!({ "user_id": user }));
    } else if let Some(user_id) = user {
        println!("{user_id}");
    } else {
        eprintln!("Not signed in. Use `reps login <user>` to start.");
    }

    Ok(())
}
