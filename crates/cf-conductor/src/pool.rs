//! Player Pool
//!
//! Players move out of the pool on [`PlayerPool::rent`] and come back by
//! value through [`PlayerPool::give_back`]. A player can only be returned by
//! whoever owns it, so double returns cannot be expressed.

use cf_core::{PlayerSettings, PoolSettings};

use crate::host::{SharedClock, SourceFactory};
use crate::player::Player;

/// Pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Players built since the pool was created
    pub created: usize,
    /// Players waiting in the pool
    pub idle: usize,
    /// Players currently out
    pub rented: usize,
}

pub struct PlayerPool {
    idle: Vec<Player>,
    factory: Box<dyn SourceFactory>,
    clock: SharedClock,
    player_settings: PlayerSettings,
    max_idle: usize,
    created: usize,
    rented: usize,
}

impl PlayerPool {
    /// Create a pool and pre-warm `initial_players` players
    pub fn new(
        factory: Box<dyn SourceFactory>,
        clock: SharedClock,
        player_settings: PlayerSettings,
        pool_settings: &PoolSettings,
    ) -> Self {
        let mut pool = Self {
            idle: Vec::with_capacity(pool_settings.initial_players),
            factory,
            clock,
            player_settings,
            max_idle: pool_settings.max_idle_players,
            created: 0,
            rented: 0,
        };
        let warm = pool_settings.initial_players.min(pool.max_idle);
        for _ in 0..warm {
            let player = pool.build();
            pool.idle.push(player);
        }
        log::debug!("PlayerPool: pre-warmed {} players", warm);
        pool
    }

    fn build(&mut self) -> Player {
        self.created += 1;
        let sources = [self.factory.create_source(), self.factory.create_source()];
        Player::new(sources, self.clock.clone(), self.player_settings.clone())
    }

    /// Take a player out of the pool, building one when none is idle
    pub fn rent(&mut self) -> Player {
        self.rented += 1;
        match self.idle.pop() {
            Some(player) => player,
            None => self.build(),
        }
    }

    /// Reset a player and keep it for reuse (dropped past the idle cap)
    pub fn give_back(&mut self, mut player: Player) {
        player.reset();
        self.rented = self.rented.saturating_sub(1);
        if self.idle.len() < self.max_idle {
            self.idle.push(player);
        } else {
            log::debug!("PlayerPool: idle cap {} reached, dropping player", self.max_idle);
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created,
            idle: self.idle.len(),
            rented: self.rented,
        }
    }
}

impl std::fmt::Debug for PlayerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerPool")
            .field("stats", &self.stats())
            .field("max_idle", &self.max_idle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_host::VirtualHost;

    fn pool(host: &VirtualHost, initial: usize, max_idle: usize) -> PlayerPool {
        PlayerPool::new(
            Box::new(host.factory()),
            host.clock(),
            PlayerSettings::default(),
            &PoolSettings {
                initial_players: initial,
                max_idle_players: max_idle,
            },
        )
    }

    #[test]
    fn test_prewarm() {
        let host = VirtualHost::new();
        let pool = pool(&host, 4, 16);
        assert_eq!(
            pool.stats(),
            PoolStats {
                created: 4,
                idle: 4,
                rented: 0
            }
        );
        // Two sources per player
        assert_eq!(host.sources().len(), 8);
    }

    #[test]
    fn test_rent_and_return_balance() {
        let host = VirtualHost::new();
        let mut pool = pool(&host, 1, 16);

        let a = pool.rent();
        let b = pool.rent();
        assert_eq!(pool.stats().rented, 2);
        assert_eq!(pool.stats().created, 2);

        pool.give_back(a);
        pool.give_back(b);
        let stats = pool.stats();
        assert_eq!(stats.rented, 0);
        assert_eq!(stats.idle, 2);
    }

    #[test]
    fn test_idle_cap_drops_surplus() {
        let host = VirtualHost::new();
        let mut pool = pool(&host, 0, 1);

        let a = pool.rent();
        let b = pool.rent();
        pool.give_back(a);
        pool.give_back(b);
        assert_eq!(pool.stats().idle, 1);
    }

    #[test]
    fn test_returned_player_is_reset() {
        let host = VirtualHost::new();
        let mut pool = pool(&host, 0, 4);
        let mut player = pool.rent();
        player.set_volume(0.3);
        pool.give_back(player);

        let player = pool.rent();
        assert_eq!(player.volume(), 1.0);
        assert!(player.clip().is_none());
    }
}
