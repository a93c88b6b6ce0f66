//! Contact damage resolution.
//!
//! After all entities have stepped, a shark standing on the same cell as a
//! live goodie bites it for damage_rate x dt. Health only ever goes down;
//! a character at zero health is dead and out of play.

use hecs::{Entity, World};

use crate::components::{ActionState, Health, Position, Role, Shark};
use crate::events::{EventQueue, GameEvent};

/// Resolve shark/goodie contacts against post-step positions.
pub fn resolve_contacts(world: &mut World, dt: f32, events: &mut EventQueue) {
    puffin::profile_function!();

    // Collect attacks first; applying damage while iterating would alias the
    // world borrow.
    let mut attacks: Vec<(Entity, Entity, f32)> = Vec::new();
    for (shark_entity, (pos, shark, health)) in
        world.query::<(&Position, &Shark, &Health)>().iter()
    {
        if !health.is_alive() {
            continue;
        }
        let cell = pos.cell();
        for (goodie_entity, (goodie_pos, role, goodie_health)) in
            world.query::<(&Position, &Role, &Health)>().iter()
        {
            if *role == Role::Goodie && goodie_health.is_alive() && goodie_pos.cell() == cell {
                attacks.push((shark_entity, goodie_entity, shark.damage_rate * dt));
            }
        }
    }

    for (attacker, target, damage) in attacks {
        if let Ok(mut action) = world.get::<&mut ActionState>(attacker) {
            *action = ActionState::Attack;
        }

        let died = {
            let Ok(mut health) = world.get::<&mut Health>(target) else {
                continue;
            };
            health.take_damage(damage);
            !health.is_alive()
        };

        if let Ok(mut action) = world.get::<&mut ActionState>(target) {
            *action = if died { ActionState::Die } else { ActionState::Attacked };
        }

        events.push(GameEvent::ContactDamage { attacker, target, damage });
        if died {
            events.push(GameEvent::CharacterDied { entity: target });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Facing, Mover, Speed};
    use crate::constants::SHARK_DAMAGE_RATE;

    fn spawn_goodie(world: &mut World, x: f32, y: f32) -> Entity {
        world.spawn((
            Position::new(x, y),
            Mover::default(),
            Speed { water: 1.0, land: 2.0 },
            Role::Goodie,
            Health::new(100.0),
            ActionState::TreadWater,
            Facing::default(),
        ))
    }

    fn spawn_shark(world: &mut World, x: f32, y: f32) -> Entity {
        world.spawn((
            Position::new(x, y),
            Mover::default(),
            Speed { water: 2.0, land: 0.0 },
            Role::Baddie,
            Shark { damage_rate: SHARK_DAMAGE_RATE },
            Health::new(100.0),
            ActionState::Swim,
            Facing::default(),
        ))
    }

    #[test]
    fn test_contact_damage_scales_with_dt() {
        let mut world = World::new();
        let goodie = spawn_goodie(&mut world, 2.0, 2.0);
        spawn_shark(&mut world, 2.0, 2.0);

        let mut events = EventQueue::new();
        resolve_contacts(&mut world, 0.5, &mut events);

        let health = *world.get::<&Health>(goodie).unwrap();
        assert_eq!(health.current, 100.0 - SHARK_DAMAGE_RATE * 0.5);
        assert_eq!(*world.get::<&ActionState>(goodie).unwrap(), ActionState::Attacked);
    }

    #[test]
    fn test_no_contact_no_damage() {
        let mut world = World::new();
        let goodie = spawn_goodie(&mut world, 0.0, 0.0);
        spawn_shark(&mut world, 3.0, 3.0);

        let mut events = EventQueue::new();
        resolve_contacts(&mut world, 1.0, &mut events);

        assert_eq!(world.get::<&Health>(goodie).unwrap().current, 100.0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_lethal_contact_emits_death() {
        let mut world = World::new();
        let goodie = spawn_goodie(&mut world, 1.0, 1.0);
        world.get::<&mut Health>(goodie).unwrap().current = 1.0;
        spawn_shark(&mut world, 1.0, 1.0);

        let mut events = EventQueue::new();
        resolve_contacts(&mut world, 1.0, &mut events);

        let health = *world.get::<&Health>(goodie).unwrap();
        assert_eq!(health.current, 0.0);
        assert_eq!(*world.get::<&ActionState>(goodie).unwrap(), ActionState::Die);
        assert!(events
            .drain()
            .any(|e| matches!(e, GameEvent::CharacterDied { entity } if entity == goodie)));
    }

    #[test]
    fn test_dead_goodie_is_not_bitten_again() {
        let mut world = World::new();
        let goodie = spawn_goodie(&mut world, 1.0, 1.0);
        world.get::<&mut Health>(goodie).unwrap().current = 0.0;
        spawn_shark(&mut world, 1.0, 1.0);

        let mut events = EventQueue::new();
        resolve_contacts(&mut world, 1.0, &mut events);
        assert!(events.is_empty());
    }
}
