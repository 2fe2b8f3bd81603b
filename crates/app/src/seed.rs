use std::error::Error;

use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{AppServices, AuthError, Clock, TreeInit, synthesize_entries};
use tracing::info;
use wellness_core::model::{User, UserId};

use crate::cli::SeedArgs;

/// What a seed run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub user_id: UserId,
    pub created_user: bool,
    pub tree: TreeInit,
    pub timeline_entries: usize,
}

/// Validate the demo account fields before anything touches storage.
fn demo_account(args: &SeedArgs, clock: Clock) -> Result<User, wellness_core::Error> {
    Ok(User::new(UserId::new(0), &args.email, &args.name, clock.now())?)
}

/// Create or reuse the demo user, write its practice tree and replace its timeline.
///
/// # Errors
///
/// Fails on invalid account fields, a wrong password for an existing demo
/// user, or any storage error.
pub async fn run(
    services: &AppServices,
    args: &SeedArgs,
    clock: Clock,
) -> Result<SeedReport, Box<dyn Error>> {
    let account = demo_account(args, clock)?;

    let auth = services.auth();
    let (session, created_user) = match auth
        .register(account.email(), &args.password, account.name())
        .await
    {
        Ok(session) => (session, true),
        Err(AuthError::UserExists) => (auth.login(account.email(), &args.password).await?, false),
        Err(err) => return Err(err.into()),
    };
    let user_id = session.user.id();

    let tree = services.practice().initialize(user_id, args.force).await?;

    let mut rng = match args.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let entries = synthesize_entries(&mut rng, clock.today(), args.days);
    services.timeline().replace(user_id, &entries).await?;

    info!(
        user = %user_id,
        email = account.email(),
        created_user,
        tree = ?tree,
        entries = entries.len(),
        "seed complete"
    );
    Ok(SeedReport {
        user_id,
        created_user,
        tree,
        timeline_entries: entries.len(),
    })
}
