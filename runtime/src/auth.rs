//! Portal login.
//!
//! Fills the two credential fields and submits with Enter. Whether the login
//! worked is not checked here: a rejected login shows up later as a landing
//! page without module panels.

use crate::config::Credentials;
use crate::locators::PortalLocators;
use crate::renderer::PortalPage;
use anyhow::{Context, Result};

/// Open the portal and sign in.
pub async fn login<P: PortalPage + ?Sized>(
    page: &mut P,
    locators: &PortalLocators,
    portal_url: &str,
    credentials: &Credentials,
) -> Result<()> {
    tracing::info!("opening {portal_url}");
    page.goto(portal_url).await?;

    page.fill(&locators.user_id_input, &credentials.user_id)
        .await
        .context("failed to fill user id")?;
    page.fill(&locators.password_input, &credentials.password)
        .await
        .context("failed to fill password")?;
    page.submit(&locators.password_input)
        .await
        .context("failed to submit login form")?;

    tracing::info!("login submitted");
    Ok(())
}
