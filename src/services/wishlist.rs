//! Wishlist service
//!
//! Guests keep their list in local storage under a lazily generated session
//! id, mirrored best-effort to the remote guest table. Signed-in users keep
//! their list remotely. Signing in moves the guest rows to the account once.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::aggregates::{Wishlist, WishlistItem};
use crate::domain::value_objects::{ProductId, SessionId, UserId, VariantId};
use crate::storage::KeyValueStorage;
use crate::{EcommerceError, Result};

pub const WISHLIST_SESSION_KEY: &str = "wishlist_session_id";
pub const GUEST_WISHLIST_KEY: &str = "guest_wishlist";

#[async_trait]
pub trait WishlistRepository: Send + Sync {
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<WishlistItem>>;
    /// Fails with [`EcommerceError::Duplicate`] when the pair is already stored.
    async fn add_for_user(&self, user: &UserId, item: &WishlistItem) -> Result<()>;
    async fn remove_for_user(&self, user: &UserId, product_id: &ProductId, variant_id: Option<&VariantId>) -> Result<()>;
    /// Replaces the guest table rows for `session` with `items`.
    async fn mirror_guest(&self, session: &SessionId, items: &[WishlistItem]) -> Result<()>;
    /// Moves the guest rows of `session` to `user`, returning how many moved.
    async fn migrate_guest(&self, session: &SessionId, user: &UserId) -> Result<u64>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WishlistOwner {
    Guest(SessionId),
    User(UserId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WishlistOutcome {
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
}

pub struct WishlistService<S> {
    storage: S,
    repo: Arc<dyn WishlistRepository>,
    owner: WishlistOwner,
    wishlist: Wishlist,
}

impl<S: KeyValueStorage> WishlistService<S> {
    /// Opens the wishlist for the current visitor. With a signed-in `user`
    /// any leftover guest list is migrated to the account first.
    pub async fn open(mut storage: S, repo: Arc<dyn WishlistRepository>, user: Option<UserId>) -> Result<Self> {
        match user {
            Some(user) => {
                let mut service = Self { storage, repo, owner: WishlistOwner::User(user.clone()), wishlist: Wishlist::default() };
                service.migrate_guest_rows(&user).await?;
                service.reload().await?;
                Ok(service)
            }
            None => {
                let session = guest_session(&storage)?;
                storage.set(WISHLIST_SESSION_KEY, session.as_str())?;
                let mut service = Self { storage, repo, owner: WishlistOwner::Guest(session), wishlist: Wishlist::default() };
                service.wishlist = service.load_guest_list()?;
                Ok(service)
            }
        }
    }

    pub fn owner(&self) -> &WishlistOwner { &self.owner }
    pub fn wishlist(&self) -> &Wishlist { &self.wishlist }

    pub fn is_in_wishlist(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        self.wishlist.contains(product_id, variant_id)
    }

    pub async fn add_to_wishlist(&mut self, product_id: ProductId, variant_id: Option<VariantId>) -> Result<WishlistOutcome> {
        let item = WishlistItem::new(product_id, variant_id);
        match self.owner.clone() {
            WishlistOwner::User(user) => match self.repo.add_for_user(&user, &item).await {
                Ok(()) => {
                    self.wishlist.insert(item);
                    Ok(WishlistOutcome::Added)
                }
                Err(EcommerceError::Duplicate(_)) => {
                    self.wishlist.insert(item);
                    Ok(WishlistOutcome::AlreadyPresent)
                }
                Err(e) => Err(e),
            },
            WishlistOwner::Guest(session) => {
                if !self.wishlist.insert(item) { return Ok(WishlistOutcome::AlreadyPresent); }
                self.save_guest_list()?;
                self.mirror(&session).await;
                Ok(WishlistOutcome::Added)
            }
        }
    }

    pub async fn remove_from_wishlist(&mut self, product_id: &ProductId, variant_id: Option<&VariantId>) -> Result<WishlistOutcome> {
        match self.owner.clone() {
            WishlistOwner::User(user) => {
                self.repo.remove_for_user(&user, product_id, variant_id).await?;
                Ok(if self.wishlist.remove(product_id, variant_id) { WishlistOutcome::Removed } else { WishlistOutcome::NotPresent })
            }
            WishlistOwner::Guest(session) => {
                if !self.wishlist.remove(product_id, variant_id) { return Ok(WishlistOutcome::NotPresent); }
                self.save_guest_list()?;
                self.mirror(&session).await;
                Ok(WishlistOutcome::Removed)
            }
        }
    }

    /// Switches a guest wishlist to `user`, migrating the guest rows once.
    pub async fn sign_in(&mut self, user: UserId) -> Result<()> {
        if self.owner == WishlistOwner::User(user.clone()) { return Ok(()); }
        self.migrate_guest_rows(&user).await?;
        self.owner = WishlistOwner::User(user);
        self.reload().await
    }

    /// Drops back to an empty guest wishlist with a new session.
    pub fn sign_out(&mut self) -> Result<()> {
        let session = guest_session(&self.storage)?;
        self.storage.set(WISHLIST_SESSION_KEY, session.as_str())?;
        self.owner = WishlistOwner::Guest(session);
        self.wishlist = Wishlist::default();
        Ok(())
    }

    /// Re-reads the list from its source of truth.
    pub async fn reload(&mut self) -> Result<()> {
        self.wishlist = match &self.owner {
            WishlistOwner::User(user) => Wishlist::new(self.repo.list_for_user(user).await?),
            WishlistOwner::Guest(_) => self.load_guest_list()?,
        };
        Ok(())
    }

    pub fn into_storage(self) -> S { self.storage }

    async fn migrate_guest_rows(&mut self, user: &UserId) -> Result<()> {
        let Some(raw) = self.storage.get(WISHLIST_SESSION_KEY)? else { return Ok(()) };
        let session = SessionId::new(raw);
        // push any local-only entries before the server moves the rows
        let local = self.load_guest_list()?;
        if !local.is_empty() {
            self.repo.mirror_guest(&session, local.items()).await?;
        }
        let moved = self.repo.migrate_guest(&session, user).await?;
        tracing::info!(%session, %user, moved, "migrated guest wishlist");
        self.storage.remove(GUEST_WISHLIST_KEY)?;
        self.storage.remove(WISHLIST_SESSION_KEY)?;
        Ok(())
    }

    async fn mirror(&self, session: &SessionId) {
        if let Err(e) = self.repo.mirror_guest(session, self.wishlist.items()).await {
            tracing::warn!(%session, error = %e, "failed to mirror guest wishlist");
        }
    }

    fn load_guest_list(&self) -> Result<Wishlist> {
        match self.storage.get(GUEST_WISHLIST_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Wishlist::default()),
        }
    }

    fn save_guest_list(&mut self) -> Result<()> {
        let raw = serde_json::to_string(&self.wishlist)?;
        self.storage.set(GUEST_WISHLIST_KEY, &raw)?;
        Ok(())
    }
}

/// The stored guest session id, or a freshly generated one.
fn guest_session<S: KeyValueStorage>(storage: &S) -> Result<SessionId> {
    Ok(storage.get(WISHLIST_SESSION_KEY)?.map(SessionId::new).unwrap_or_else(SessionId::generate))
}
