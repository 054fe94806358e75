//! In-memory game store.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::games::model::{Game, NewGame};

/// Concurrent game catalogue keyed by id.
#[derive(Debug)]
pub struct GameStore {
    games: DashMap<u64, Game>,
    next_id: AtomicU64,
}

impl GameStore {
    pub fn new() -> Self {
        Self {
            games: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// All games ordered by id.
    pub fn list(&self) -> Vec<Game> {
        let mut games: Vec<Game> = self.games.iter().map(|e| e.value().clone()).collect();
        games.sort_by_key(|g| g.id);
        games
    }

    pub fn get(&self, id: u64) -> Option<Game> {
        self.games.get(&id).map(|e| e.value().clone())
    }

    /// Games whose name contains `name`, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Vec<Game> {
        let needle = name.to_lowercase();
        let mut games: Vec<Game> = self
            .games
            .iter()
            .filter(|e| e.value().name.to_lowercase().contains(&needle))
            .map(|e| e.value().clone())
            .collect();
        games.sort_by_key(|g| g.id);
        games
    }

    pub fn create(&self, new_game: NewGame) -> Game {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let game = new_game.into_game(id);
        self.games.insert(id, game.clone());
        tracing::debug!(id, name = %game.name, "Game created");
        game
    }

    /// Replace an existing game. `None` if the id is unknown.
    pub fn update(&self, game: Game) -> Option<Game> {
        let mut entry = self.games.get_mut(&game.id)?;
        *entry = game.clone();
        Some(game)
    }

    pub fn delete(&self, id: u64) -> bool {
        self.games.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_game(name: &str) -> NewGame {
        NewGame {
            name: name.into(),
            star_rating: Some(4),
            developer: "Studio".into(),
            year: 2020,
            finished: false,
        }
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let store = GameStore::new();
        assert_eq!(store.create(new_game("A")).id, 1);
        assert_eq!(store.create(new_game("B")).id, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_list_is_ordered() {
        let store = GameStore::new();
        for name in ["C", "A", "B", "D"] {
            store.create(new_game(name));
        }
        let ids: Vec<u64> = store.list().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_find_by_name_ignores_case() {
        let store = GameStore::new();
        store.create(new_game("Super Mario Odyssey"));
        store.create(new_game("Mario Kart 8"));
        store.create(new_game("Zelda"));

        let found = store.find_by_name("MARIO");
        assert_eq!(found.len(), 2);
        assert!(store.find_by_name("metroid").is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let store = GameStore::new();
        let mut game = store.create(new_game("A"));
        game.finished = true;

        assert_eq!(store.update(game.clone()), Some(game.clone()));
        assert!(store.get(game.id).unwrap().finished);

        let unknown = Game { id: 99, ..game.clone() };
        assert!(store.update(unknown).is_none());

        assert!(store.delete(game.id));
        assert!(!store.delete(game.id));
        assert!(store.is_empty());
    }
}
