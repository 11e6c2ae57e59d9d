use epidemy::model::{Agent, Population, Position, SpatialGrid};

/// Place one agent per cell, in order, on a fresh grid.
pub fn populate(width: u32, height: u32, cells: &[(i32, i32)]) -> (Population, SpatialGrid) {
    let mut grid = SpatialGrid::new(width, height);
    let mut population = Population::new();
    for &(x, y) in cells {
        let id = population.next_id();
        grid.place(id, x, y).unwrap();
        population.push(Agent::new(id, Position::new(x, y)));
    }
    (population, grid)
}

/// Every live agent sits on its own cell and nothing else is on the grid.
pub fn assert_grid_in_sync(population: &Population, grid: &SpatialGrid) {
    let mut live = 0;
    for agent in population {
        let p = agent.position();
        if agent.is_dead() {
            assert_ne!(
                grid.occupant_at(p.x, p.y),
                Some(agent.id),
                "dead {} still on the grid",
                agent.id
            );
        } else {
            live += 1;
            assert!(grid.in_bounds(p.x, p.y), "{} out of bounds at {p:?}", agent.id);
            assert_eq!(grid.occupant_at(p.x, p.y), Some(agent.id));
        }
    }
    assert_eq!(grid.occupied_count(), live);
}
