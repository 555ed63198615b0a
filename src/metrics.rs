use crate::species::SpeciesId;
use crate::world::World;

/// Count creatures per species. The result has `species_count` entries,
/// indexed by species handle.
pub fn census(world: &World, species_count: usize) -> Vec<usize> {
    let mut counts = vec![0usize; species_count];
    for creature in world.creatures() {
        if let Some(slot) = counts.get_mut(creature.species().index()) {
            *slot += 1;
        }
    }
    counts
}

/// The species with the most creatures. Ties go to the lower handle.
pub fn dominant(counts: &[usize]) -> Option<(SpeciesId, usize)> {
    counts
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, n)| n > 0)
        .fold(None, |best, (i, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((SpeciesId(i), n)),
        })
}

/// True once every creature belongs to a single species.
pub fn is_fixated(counts: &[usize]) -> bool {
    counts.iter().filter(|&&n| n > 0).count() == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::Creature;
    use crate::world::{Direction, Position};

    #[test]
    fn test_census_counts_each_species() {
        let mut world = World::new(4, 4).unwrap();
        for (i, kind) in [0, 1, 1, 2, 1].into_iter().enumerate() {
            world
                .spawn(Creature::new(
                    SpeciesId(kind),
                    Position::new(i as i32 % 4, i as i32 / 4),
                    Direction::North,
                ))
                .unwrap();
        }
        assert_eq!(census(&world, 4), vec![1, 3, 1, 0]);
    }

    #[test]
    fn test_census_empty_world() {
        let world = World::new(2, 2).unwrap();
        assert_eq!(census(&world, 2), vec![0, 0]);
    }

    #[test]
    fn test_dominant() {
        assert_eq!(dominant(&[1, 3, 1]), Some((SpeciesId(1), 3)));
        assert_eq!(dominant(&[2, 2]), Some((SpeciesId(0), 2)));
        assert_eq!(dominant(&[0, 0]), None);
        assert_eq!(dominant(&[]), None);
    }

    #[test]
    fn test_fixation() {
        assert!(is_fixated(&[0, 7, 0]));
        assert!(!is_fixated(&[1, 7, 0]));
        assert!(!is_fixated(&[0, 0]));
    }
}
