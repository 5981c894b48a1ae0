//! Key lifecycle commands.

use std::{
    io::{BufRead, Write},
    sync::Arc,
};

use {
    anyhow::{Context, Result, bail},
    krypta_config::{KryptaConfig, Severity},
    krypta_keys::{
        EncryptionStatus, ErrorKind, KeyError, KeyManager, KeyParams, LocalStore, SealedField,
        Session, SqliteStore, WsTransport, policy,
    },
    krypta_protocol::PasswordSettings,
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

/// Backup code groups per printed line.
const GROUPS_PER_LINE: usize = 8;

/// Shared setup for every key command.
pub struct CommandContext {
    config: KryptaConfig,
    params: KeyParams,
}

impl CommandContext {
    /// Refuses configs with validation errors; key material created from a
    /// bad config cannot be undone.
    pub fn new(config: KryptaConfig) -> Result<Self> {
        let result = krypta_config::validate(&config);
        if result.has_errors() {
            let errors: Vec<String> = result
                .diagnostics
                .iter()
                .filter(|d| d.severity == Severity::Error)
                .map(|d| format!("{}: {}", d.path, d.message))
                .collect();
            bail!(
                "invalid configuration ({}); run `krypta config check`",
                errors.join("; ")
            );
        }
        let params = KeyParams::from(&config.crypto);
        Ok(Self { config, params })
    }

    async fn store(&self) -> Result<Arc<dyn LocalStore>> {
        let path = krypta_config::database_path(&self.config);
        debug!(path = %path.display(), "opening local store");
        let store = SqliteStore::open(&path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Arc::new(store))
    }

    async fn connect(&self) -> Result<WsTransport> {
        let url = &self.config.server.url;
        WsTransport::connect(url)
            .await
            .with_context(|| format!("failed to connect to {url}"))
    }

    /// Restore the stored session and load the key state.
    async fn manager(&self) -> Result<KeyManager<WsTransport>> {
        let store = self.store().await?;
        let session = restore(store.as_ref()).await?;
        let manager = KeyManager::new(self.connect().await?, store, session, self.params);
        manager.load().await.map_err(explain)?;
        Ok(manager)
    }

    /// Like [`Self::manager`], but logs in again when the restored session
    /// has no login key. Unlocking needs the key of the current password.
    async fn keyed_manager(
        &self,
        username: Option<String>,
        password: Option<&Secret<String>>,
    ) -> Result<KeyManager<WsTransport>> {
        let store = self.store().await?;
        let session = restore(store.as_ref()).await?;
        let (transport, session) = match (session.login_key(), password) {
            (Some(_), _) => (self.connect().await?, session),
            (None, Some(password)) => {
                debug!("restored session has no login key, logging in again");
                self.login_session(store.as_ref(), username, password, false)
                    .await?
            },
            (None, None) => {
                debug!("restored session has no login key, logging in again");
                let password = self.password("Current password: ")?;
                self.login_session(store.as_ref(), username, &password, false)
                    .await?
            },
        };
        let manager = KeyManager::new(transport, store, session, self.params);
        manager.load().await.map_err(explain)?;
        Ok(manager)
    }

    async fn login_session(
        &self,
        store: &dyn LocalStore,
        username: Option<String>,
        password: &Secret<String>,
        stay_logged_in: bool,
    ) -> Result<(WsTransport, Session)> {
        let username = username
            .or_else(|| self.config.auth.username.clone())
            .context("no username: pass --username or set auth.username")?;
        let stay_logged_in = stay_logged_in || self.config.auth.stay_logged_in;

        let transport = self.connect().await?;
        let session = Session::login(
            &transport,
            store,
            &username,
            password.expose_secret(),
            stay_logged_in,
            self.params.kdf_iterations,
        )
        .await
        .map_err(explain)?;
        Ok((transport, session))
    }

    /// The configured password, or a hidden prompt.
    fn password(&self, prompt: &str) -> Result<Secret<String>> {
        match &self.config.auth.password {
            Some(password) => Ok(password.clone()),
            None => prompt_secret(prompt),
        }
    }
}

pub async fn login(
    ctx: &CommandContext,
    username: Option<String>,
    stay_logged_in: bool,
) -> Result<()> {
    let password = ctx.password("Password: ")?;
    let store = ctx.store().await?;
    let (transport, session) = ctx
        .login_session(store.as_ref(), username, &password, stay_logged_in)
        .await?;

    let manager = KeyManager::new(transport, store, session, ctx.params);
    let status = manager.load().await.map_err(explain)?;
    println!("Logged in.");
    print_status(status);
    Ok(())
}

pub async fn status(ctx: &CommandContext) -> Result<()> {
    let manager = ctx.manager().await?;
    print_status(manager.status().await);
    if !manager.has_login_key().await {
        println!(
            "This session holds no login key. `unlock`, `open` and `change-password` ask for \
             your current password."
        );
    }
    Ok(())
}

pub async fn init(ctx: &CommandContext, backup_code_saved: bool, understand: bool) -> Result<()> {
    let manager = ctx.manager().await?;

    eprintln!(
        "Generating a {}-bit key pair, this can take a moment...",
        ctx.params.rsa_modulus_bits
    );
    let mut draft = manager.create_keys().await.map_err(explain)?;

    println!();
    println!("Your backup code. It is shown only once and is never stored:");
    println!();
    for line in display_lines(&draft.backup_code_display()) {
        println!("    {line}");
    }
    println!();

    draft.backup_code_saved =
        backup_code_saved || confirm("Have you saved the backup code somewhere safe?")?;
    draft.encryption_understood = understand
        || confirm(
            "Encrypted data is lost if both your password and this code are lost. Continue?",
        )?;
    if !draft.can_store() {
        bail!("encryption was not activated; nothing was stored");
    }

    manager.store(draft).await.map_err(explain)?;
    println!("Encryption is active.");
    Ok(())
}

pub async fn unlock(
    ctx: &CommandContext,
    username: Option<String>,
    backup_code: bool,
) -> Result<()> {
    let manager = ctx.keyed_manager(username, None).await?;
    match manager.status().await {
        EncryptionStatus::Unlocked => {
            println!("Already unlocked.");
            return Ok(());
        },
        EncryptionStatus::Inactive => bail!("encryption is not active; run `krypta init`"),
        EncryptionStatus::Locked => {},
    }

    let result = if backup_code {
        let code = prompt_secret("Backup code: ")?;
        manager.unlock_with_backup_code(code.expose_secret()).await
    } else {
        let previous = prompt_secret("Previous password: ")?;
        manager.unlock_with_password(previous.expose_secret()).await
    };
    result.map_err(explain)?;

    println!("Unlocked. Your private key is now protected by your current password.");
    Ok(())
}

pub async fn change_password(ctx: &CommandContext, username: Option<String>) -> Result<()> {
    let old = ctx.password("Current password: ")?;
    let manager = ctx.keyed_manager(username, Some(&old)).await?;
    let settings = manager.password_settings().await.map_err(explain)?;
    eprintln!("New password needs {}.", describe_policy(&settings));

    let new0 = prompt_secret("New password: ")?;
    let new1 = prompt_secret("Repeat new password: ")?;

    manager
        .change_password(old.expose_secret(), new0.expose_secret(), new1.expose_secret())
        .await
        .map_err(explain)?;

    println!("Password changed.");
    if manager.status().await == EncryptionStatus::Locked {
        println!(
            "Your private key is still locked; unlock it with the password it was last protected \
             by, or with your backup code."
        );
    }
    Ok(())
}

pub async fn reset(ctx: &CommandContext, yes: bool) -> Result<()> {
    if !yes {
        bail!(
            "refusing to reset without --yes: all data encrypted for your keys becomes unreadable"
        );
    }
    let manager = ctx.manager().await?;
    manager.reset().await.map_err(explain)?;
    println!("Encryption keys deleted. Run `krypta init` to create new ones.");
    Ok(())
}

pub async fn seal(ctx: &CommandContext, value: &str) -> Result<()> {
    let manager = ctx.manager().await?;
    let sealed = manager
        .seal_field(value.as_bytes())
        .await
        .map_err(explain)?;
    println!("{}", serde_json::to_string(&sealed)?);
    Ok(())
}

pub async fn open(ctx: &CommandContext, username: Option<String>, sealed: &str) -> Result<()> {
    let sealed: SealedField = serde_json::from_str(sealed).context("invalid sealed value")?;
    let manager = ctx.keyed_manager(username, None).await?;
    let value = manager.open_field(&sealed).await.map_err(explain)?;
    println!("{}", String::from_utf8_lossy(&value));
    Ok(())
}

pub async fn logout(ctx: &CommandContext) -> Result<()> {
    let store = ctx.store().await?;
    match Session::restore(store.as_ref()).await {
        Ok(session) => {
            session.logout(store.as_ref()).await.map_err(explain)?;
            println!("Logged out.");
        },
        Err(KeyError::NotLoggedIn) => println!("Not logged in."),
        Err(e) => return Err(explain(e)),
    }
    Ok(())
}

async fn restore(store: &dyn LocalStore) -> Result<Session> {
    match Session::restore(store).await {
        Ok(session) => Ok(session),
        Err(KeyError::NotLoggedIn) => bail!("not logged in; run `krypta login` first"),
        Err(e) => Err(explain(e)),
    }
}

fn print_status(status: EncryptionStatus) {
    println!("Encryption is {status}.");
    match status {
        EncryptionStatus::Inactive => println!("Run `krypta init` to activate it."),
        EncryptionStatus::Locked => println!(
            "Run `krypta unlock` with your previous password, or `krypta unlock --backup-code`."
        ),
        EncryptionStatus::Unlocked => {},
    }
}

/// Attach context to failures that are not the user's to fix.
fn explain(err: KeyError) -> anyhow::Error {
    match err.kind() {
        ErrorKind::Recoverable | ErrorKind::Validation => anyhow::anyhow!("{err}"),
        ErrorKind::Unexpected => anyhow::Error::new(err).context("unexpected failure"),
    }
}

fn prompt_secret(prompt: &str) -> Result<Secret<String>> {
    rpassword::prompt_password(prompt)
        .map(Secret::new)
        .context("failed to read input")
}

fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
}

fn display_lines(code: &str) -> Vec<String> {
    let groups: Vec<&str> = code.split(' ').collect();
    groups
        .chunks(GROUPS_PER_LINE)
        .map(|line| line.join(" "))
        .collect()
}

fn describe_policy(settings: &PasswordSettings) -> String {
    policy::join(&policy::requirements(settings))
}
