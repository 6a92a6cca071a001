//! In-memory [`Database`] implementation.
//!
//! Every [`Memory`] instance owns its own storage, shared only by its clones.

use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracerr::Traced;

use crate::{
    domain::{pet, reservation, user, Host, Pet, Reservation, Review},
    infra::{
        database::{self, UNIQUE_REVIEW},
        Database,
    },
    read::{
        host::Bookable,
        reservation::{Occupying, OfHost, OfTutor},
        review::About,
    },
};

/// In-memory [`Database`].
///
/// Values locked by a transaction stay locked until it's committed or
/// dropped. Writes of a transaction are buffered and become visible to
/// others on [`Commit`] only, so dropping an uncommitted transaction rolls
/// it back.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Storage shared by all the clones of this [`Memory`].
    store: Arc<Store>,

    /// State of the transaction this [`Memory`] runs in, if any.
    tx: Option<Arc<Mutex<Pending>>>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the provided [`Host`] directory record, replacing the existing
    /// one with the same ID.
    pub async fn put_host(&self, host: Host) {
        _ = self.store.tables.write().await.hosts.insert(host.id, host);
    }

    /// Stores the provided [`Pet`] directory record, replacing the existing
    /// one with the same ID.
    pub async fn put_pet(&self, pet: Pet) {
        _ = self.store.tables.write().await.pets.insert(pet.id, pet);
    }

    /// Returns the [`Tables`] as seen by this [`Memory`], including its own
    /// uncommitted writes.
    async fn view(&self) -> Result<Tables, Traced<database::Error>> {
        let mut tables = self.store.tables.read().await.clone();
        if let Some(tx) = &self.tx {
            for w in &tx.lock().await.writes {
                tables.apply(w.clone()).map_err(tracerr::wrap!())?;
            }
        }
        Ok(tables)
    }

    /// Performs the provided [`Write`], buffering it until [`Commit`] when in
    /// a transaction.
    async fn write(&self, w: Write) -> Result<(), Traced<database::Error>> {
        if let Some(tx) = &self.tx {
            // Surface constraint violations right away.
            self.view()
                .await
                .map_err(tracerr::wrap!())?
                .apply(w.clone())
                .map_err(tracerr::wrap!())?;
            tx.lock().await.writes.push(w);
        } else {
            self.store
                .tables
                .write()
                .await
                .apply(w)
                .map_err(tracerr::wrap!())?;
        }
        Ok(())
    }

    /// Locks the provided [`Key`] until the end of the current transaction.
    ///
    /// Outside of a transaction, only checks that the [`Key`] is not locked.
    async fn lock(&self, key: Key) -> Result<(), Traced<database::Error>> {
        let mutex = {
            let mut locks = self.store.locks.lock().await;
            // An entry with no other owner is not locked by anyone.
            locks.retain(|k, m| *k == key || Arc::strong_count(m) > 1);
            Arc::clone(locks.entry(key).or_default())
        };

        let Some(tx) = &self.tx else {
            return mutex
                .try_lock()
                .map(drop)
                .map_err(|_| tracerr::new!(database::Error::Contended));
        };

        let mut pending = tx.lock().await;
        if pending.held.contains_key(&key) {
            return Ok(());
        }
        let guard = mutex
            .try_lock_owned()
            .map_err(|_| tracerr::new!(database::Error::Contended))?;
        _ = pending.held.insert(key, guard);
        Ok(())
    }
}

/// Storage of a [`Memory`] database.
#[derive(Debug, Default)]
struct Store {
    /// Committed data.
    tables: RwLock<Tables>,

    /// Locks of values, created on demand and pruned once released.
    locks: Mutex<HashMap<Key, Arc<Mutex<()>>>>,
}

/// Data of a [`Memory`] database.
#[derive(Clone, Debug, Default)]
struct Tables {
    /// [`Host`]s by their IDs.
    hosts: HashMap<user::Id, Host>,

    /// [`Pet`]s by their IDs.
    pets: HashMap<pet::Id, Pet>,

    /// [`Reservation`]s by their IDs.
    reservations: HashMap<reservation::Id, Reservation>,

    /// [`Review`]s in insertion order.
    reviews: Vec<Review>,
}

impl Tables {
    /// Applies the provided [`Write`] to these [`Tables`].
    fn apply(&mut self, w: Write) -> Result<(), database::Error> {
        match w {
            Write::Reservation(r) => {
                _ = self.reservations.insert(r.id(), r);
            }
            Write::Unreserve(id) => {
                _ = self.reservations.remove(&id);
            }
            Write::Review(r) => {
                if self.reviews.iter().any(|e| {
                    e.reservation_id == r.reservation_id
                        && e.reviewer_id == r.reviewer_id
                }) {
                    return Err(database::Error::Duplicate(UNIQUE_REVIEW));
                }
                self.reviews.push(r);
            }
        }
        Ok(())
    }

    /// Returns [`Reservation`]s matching the provided predicate, the most
    /// recently created first.
    fn reservations(
        &self,
        f: impl Fn(&Reservation) -> bool,
    ) -> Vec<Reservation> {
        let mut found = self
            .reservations
            .values()
            .filter(|r| f(r))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by_key(|r| (Reverse(r.created_at()), r.id()));
        found
    }

    /// Returns [`Review`]s matching the provided predicate, the most recently
    /// created first.
    fn reviews(&self, f: impl Fn(&Review) -> bool) -> Vec<Review> {
        let mut found = self
            .reviews
            .iter()
            .filter(|r| f(r))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by_key(|r| (Reverse(r.created_at), r.id));
        found
    }
}

/// Lockable value of a [`Memory`] database.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Key {
    /// [`Host`] with the provided ID.
    Host(user::Id),

    /// [`Pet`] with the provided ID.
    Pet(pet::Id),

    /// [`Reservation`] with the provided ID.
    Reservation(reservation::Id),
}

/// Uncommitted state of a transaction.
#[derive(Debug, Default)]
struct Pending {
    /// Locks held until the transaction ends.
    held: HashMap<Key, OwnedMutexGuard<()>>,

    /// Buffered writes.
    writes: Vec<Write>,
}

/// Write operation on [`Tables`].
#[derive(Clone, Debug)]
enum Write {
    /// Inserts or replaces a [`Reservation`].
    Reservation(Reservation),

    /// Removes a [`Reservation`].
    Unreserve(reservation::Id),

    /// Inserts a [`Review`].
    Review(Review),
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        if self.tx.is_some() {
            return Ok(self.clone());
        }
        Ok(Self {
            store: Arc::clone(&self.store),
            tx: Some(Arc::default()),
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Some(tx) = &self.tx else {
            return Ok(());
        };
        let mut pending = tx.lock().await;

        let mut tables = self.store.tables.write().await;
        let mut next = tables.clone();
        for w in pending.writes.drain(..) {
            next.apply(w).map_err(tracerr::wrap!())?;
        }
        *tables = next;
        drop(tables);

        pending.held.clear();
        Ok(())
    }
}

impl Database<Select<By<Option<Reservation>, reservation::Id>>> for Memory {
    type Ok = Option<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Reservation>, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .view()
            .await
            .map_err(tracerr::wrap!())?
            .reservations
            .remove(&id))
    }
}

impl Database<Select<By<Vec<Reservation>, OfTutor>>> for Memory {
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, OfTutor>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfTutor(tutor_id) = by.into_inner();
        Ok(self
            .view()
            .await
            .map_err(tracerr::wrap!())?
            .reservations(|r| r.tutor_id() == tutor_id))
    }
}

impl Database<Select<By<Vec<Reservation>, OfHost>>> for Memory {
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, OfHost>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfHost(host_id) = by.into_inner();
        Ok(self
            .view()
            .await
            .map_err(tracerr::wrap!())?
            .reservations(|r| r.host_id() == host_id))
    }
}

impl Database<Select<By<Occupying<Vec<Reservation>>, OfTutor>>> for Memory {
    type Ok = Occupying<Vec<Reservation>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Occupying<Vec<Reservation>>, OfTutor>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfTutor(tutor_id) = by.into_inner();
        Ok(Occupying(
            self.view().await.map_err(tracerr::wrap!())?.reservations(|r| {
                r.tutor_id() == tutor_id && r.status().is_occupying()
            }),
        ))
    }
}

impl Database<Select<By<Occupying<Vec<Reservation>>, OfHost>>> for Memory {
    type Ok = Occupying<Vec<Reservation>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Occupying<Vec<Reservation>>, OfHost>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfHost(host_id) = by.into_inner();
        Ok(Occupying(
            self.view().await.map_err(tracerr::wrap!())?.reservations(|r| {
                r.host_id() == host_id && r.status().is_occupying()
            }),
        ))
    }
}

impl Database<Select<By<Occupying<Vec<Reservation>>, reservation::Period>>>
    for Memory
{
    type Ok = Occupying<Vec<Reservation>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Occupying<Vec<Reservation>>, reservation::Period>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let period = by.into_inner();
        Ok(Occupying(
            self.view().await.map_err(tracerr::wrap!())?.reservations(|r| {
                r.status().is_occupying() && r.period().overlaps(&period)
            }),
        ))
    }
}

impl Database<Select<By<Option<Host>, user::Id>>> for Memory {
    type Ok = Option<Host>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Host>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.store.tables.read().await.hosts.get(&id).cloned())
    }
}

impl Database<Select<By<Vec<Host>, Bookable>>> for Memory {
    type Ok = Vec<Host>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Host>, Bookable>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut hosts = self
            .store
            .tables
            .read()
            .await
            .hosts
            .values()
            .filter(|h| h.is_bookable())
            .cloned()
            .collect::<Vec<_>>();
        hosts.sort_by_key(|h| h.id);
        Ok(hosts)
    }
}

impl<IDs> Database<Select<By<HashMap<pet::Id, Pet>, IDs>>> for Memory
where
    IDs: AsRef<[pet::Id]>,
{
    type Ok = HashMap<pet::Id, Pet>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<pet::Id, Pet>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        let tables = self.store.tables.read().await;
        Ok(ids
            .as_ref()
            .iter()
            .filter_map(|id| tables.pets.get(id))
            .map(|p| (p.id, p.clone()))
            .collect())
    }
}

impl Database<Select<By<Vec<Review>, reservation::Id>>> for Memory {
    type Ok = Vec<Review>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Review>, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .view()
            .await
            .map_err(tracerr::wrap!())?
            .reviews(|r| r.reservation_id == id))
    }
}

impl Database<Select<By<Vec<Review>, About>>> for Memory {
    type Ok = Vec<Review>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Review>, About>>,
    ) -> Result<Self::Ok, Self::Err> {
        let About(user_id) = by.into_inner();
        Ok(self
            .view()
            .await
            .map_err(tracerr::wrap!())?
            .reviews(|r| r.reviewed_id == user_id))
    }
}

impl Database<Lock<By<Host, user::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Host, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Host(by.into_inner()))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Lock<By<Pet, pet::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Pet, pet::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Pet(by.into_inner()))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Lock<By<Reservation, reservation::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Reservation, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.lock(Key::Reservation(by.into_inner()))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Insert<Reservation>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(reservation): Insert<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::Reservation(reservation))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Update<Reservation>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(reservation): Update<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(mut stored) = self
            .view()
            .await
            .map_err(tracerr::wrap!())?
            .reservations
            .remove(&reservation.id())
        else {
            return Ok(());
        };
        // Only the status is mutable.
        stored.set_status(reservation.status());

        self.write(Write::Reservation(stored))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Delete<By<Reservation, reservation::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Reservation, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::Unreserve(by.into_inner()))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Insert<Review>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(review): Insert<Review>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::Review(review))
            .await
            .map_err(tracerr::wrap!())
    }
}
