#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Full lifecycle against the in-memory backend, with sessions persisted in
//! SQLite the way the CLI does it.

use std::sync::Arc;

use krypta_keys::{
    EncryptionStatus, KeyError, KeyManager, KeyParams, LocalStore, MemoryBackend, Session,
    SqliteStore,
};

const PARAMS: KeyParams = KeyParams {
    kdf_iterations: 100,
    rsa_modulus_bits: 2048,
};

async fn sqlite_store(dir: &tempfile::TempDir) -> Arc<dyn LocalStore> {
    Arc::new(SqliteStore::open(&dir.path().join("krypta.db")).await.unwrap())
}

async fn login(
    backend: &MemoryBackend,
    store: &Arc<dyn LocalStore>,
    username: &str,
    password: &str,
) -> KeyManager<krypta_keys::MemoryTransport> {
    let transport = backend.connect();
    let session = Session::login(
        &transport,
        store.as_ref(),
        username,
        password,
        false,
        PARAMS.kdf_iterations,
    )
    .await
    .unwrap();
    KeyManager::new(transport, store.clone(), session, PARAMS)
}

#[tokio::test]
async fn create_relock_and_recover_with_password() {
    let backend = MemoryBackend::new();
    backend.add_user("bob", "P1").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let store = sqlite_store(&dir).await;

    // Session 1: log in with "P1", create and store keys.
    let first = login(&backend, &store, "bob", "P1").await;
    assert_eq!(first.load().await.unwrap(), EncryptionStatus::Inactive);

    let mut draft = first.create_keys().await.unwrap();
    draft.backup_code_saved = true;
    draft.encryption_understood = true;
    first.store(draft).await.unwrap();
    assert_eq!(first.status().await, EncryptionStatus::Unlocked);

    let sealed = first.seal_field(b"payroll").await.unwrap();
    let public_key = first.public_key_pem().await;
    first.logout().await.unwrap();

    let store = sqlite_store(&dir).await;
    let restored = Session::restore(store.as_ref()).await;
    assert!(matches!(restored, Err(KeyError::NotLoggedIn)));

    // The password is reset to "P2" elsewhere.
    backend.set_password("bob", "P2");

    // A later run restores that login without its key, which cannot
    // repair privateKeyEnc.
    drop(login(&backend, &store, "bob", "P2").await);
    let restored = Session::restore(store.as_ref()).await.unwrap();
    assert!(restored.login_key().is_none());
    let keyless = KeyManager::new(backend.connect(), store.clone(), restored, PARAMS);
    assert_eq!(keyless.load().await.unwrap(), EncryptionStatus::Locked);
    assert!(matches!(
        keyless.unlock_with_password("P1").await,
        Err(KeyError::NoLoginKey)
    ));

    // Session 2: logged in with "P2", so the keys load locked.
    let second = login(&backend, &store, "bob", "P2").await;
    assert_eq!(second.load().await.unwrap(), EncryptionStatus::Locked);
    assert!(matches!(
        second.open_field(&sealed).await,
        Err(KeyError::InvalidState { .. })
    ));

    // Recover with the previous password: unlocked with the same key pair.
    second.unlock_with_password("P1").await.unwrap();
    assert_eq!(second.status().await, EncryptionStatus::Unlocked);
    assert_eq!(second.public_key_pem().await, public_key);
    assert_eq!(second.open_field(&sealed).await.unwrap().as_slice(), b"payroll");

    // Session 3: the current password now unlocks directly.
    let third = login(&backend, &store, "bob", "P2").await;
    assert_eq!(third.load().await.unwrap(), EncryptionStatus::Unlocked);
}

#[tokio::test]
async fn stay_logged_in_survives_restart() {
    let backend = MemoryBackend::new();
    backend.add_user("carol", "long-password-1").unwrap();
    let dir = tempfile::tempdir().unwrap();

    {
        let store = sqlite_store(&dir).await;
        let transport = backend.connect();
        let session = Session::login(
            &transport,
            store.as_ref(),
            "carol",
            "long-password-1",
            true,
            PARAMS.kdf_iterations,
        )
        .await
        .unwrap();
        let manager = KeyManager::new(transport, store, session, PARAMS);
        manager.load().await.unwrap();
        let mut draft = manager.create_keys().await.unwrap();
        draft.backup_code_saved = true;
        draft.encryption_understood = true;
        manager.store(draft).await.unwrap();
    }

    let store = sqlite_store(&dir).await;
    let session = Session::restore(store.as_ref()).await.unwrap();
    assert!(session.login_key().is_some());
    let manager = KeyManager::new(backend.connect(), store, session, PARAMS);
    assert_eq!(manager.load().await.unwrap(), EncryptionStatus::Unlocked);
}

#[tokio::test]
async fn forgotten_password_recovers_with_backup_code() {
    let backend = MemoryBackend::new();
    backend.add_user("dave", "original-password").unwrap();
    let store: Arc<dyn LocalStore> = Arc::new(krypta_keys::MemoryStore::new());

    let transport = backend.connect();
    let session = Session::login(
        &transport,
        store.as_ref(),
        "dave",
        "original-password",
        false,
        PARAMS.kdf_iterations,
    )
    .await
    .unwrap();
    let manager = KeyManager::new(transport, store.clone(), session, PARAMS);
    manager.load().await.unwrap();
    let mut draft = manager.create_keys().await.unwrap();
    let shown = draft.backup_code_display();
    draft.backup_code_saved = true;
    draft.encryption_understood = true;
    manager.store(draft).await.unwrap();
    let sealed = manager.seal_field(b"diagnosis").await.unwrap();

    // An administrator resets the password; the old one is forgotten.
    backend.set_password("dave", "admin-issued-password");
    let transport = backend.connect();
    let session = Session::login(
        &transport,
        store.as_ref(),
        "dave",
        "admin-issued-password",
        false,
        PARAMS.kdf_iterations,
    )
    .await
    .unwrap();
    let manager = KeyManager::new(transport, store.clone(), session, PARAMS);
    assert_eq!(manager.load().await.unwrap(), EncryptionStatus::Locked);

    // The code as typed from the printout, line-wrapped.
    let typed = shown.replace(' ', "\n");
    manager.unlock_with_backup_code(&typed).await.unwrap();
    assert_eq!(manager.open_field(&sealed).await.unwrap().as_slice(), b"diagnosis");

    // The next login with the new password is unlocked straight away.
    let transport = backend.connect();
    let session = Session::login(
        &transport,
        store.as_ref(),
        "dave",
        "admin-issued-password",
        false,
        PARAMS.kdf_iterations,
    )
    .await
    .unwrap();
    let manager = KeyManager::new(transport, store, session, PARAMS);
    assert_eq!(manager.load().await.unwrap(), EncryptionStatus::Unlocked);
}
