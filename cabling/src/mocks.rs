//! Small hand-built wind farms for tests.

use windfarm::{EdgeId, Instance, VertexId, Windfarm};

/// One turbine at the origin, one substation (capacity 5) ten units away,
/// a single connecting edge.
pub fn single_link_farm() -> Windfarm {
    let mut instance = Instance::with_default_cables(0, 1);
    let t0 = instance.add_turbine(0.0, 0.0);
    let s = instance.add_substation(10.0, 0.0, 5);
    instance.add_edge(t0, s);
    Windfarm::new(&instance)
}

/// Two turbines and one substation (capacity 5) with a short edge between
/// the turbines:
///
/// ```text
/// edge 0: t0 -> s   (length 10)
/// edge 1: t1 -> s   (length 9)
/// edge 2: t0 -> t1  (length 1)
/// ```
pub fn triangle_farm() -> Windfarm {
    let mut instance = Instance::with_default_cables(0, 1);
    let t0 = instance.add_turbine(0.0, 0.0);
    let t1 = instance.add_turbine(1.0, 0.0);
    let s = instance.add_substation(10.0, 0.0, 5);
    instance.add_edge(t0, s);
    instance.add_edge(t1, s);
    instance.add_edge(t0, t1);
    Windfarm::new(&instance)
}

/// Two turbines, two unit-capacity substations, each turbine next to one
/// of them, plus connections that allow rerouting:
///
/// ```text
/// edge 0: t0 -> s2  (length 1)
/// edge 1: t1 -> s3  (length 1)
/// edge 2: t0 -> t1  (length 10)
/// edge 3: t1 -> s2  (length 9)
/// ```
pub fn two_substation_farm() -> Windfarm {
    let mut instance = Instance::with_default_cables(0, 1);
    let t0 = instance.add_turbine(0.0, 0.0);
    let t1 = instance.add_turbine(10.0, 0.0);
    let s2 = instance.add_substation(1.0, 0.0, 1);
    let s3 = instance.add_substation(11.0, 0.0, 1);
    instance.add_edge(t0, s2);
    instance.add_edge(t1, s3);
    instance.add_edge(t0, t1);
    instance.add_edge(t1, s2);
    Windfarm::new(&instance)
}

/// A farm where hop count and Euclidean length disagree: a two-hop route
/// over a far-out relay turbine versus a three-hop chain along the axis.
///
/// ```text
/// edge 0: t0 -> t1  (length ~7.1)
/// edge 1: t1 -> s   (length ~5.4)
/// edge 2: t0 -> t2  (length 1)
/// edge 3: t2 -> t3  (length 1)
/// edge 4: t3 -> s   (length 1)
/// ```
pub fn detour_farm() -> Windfarm {
    let mut instance = Instance::with_default_cables(0, 1);
    let t0 = instance.add_turbine(0.0, 0.0);
    let t1 = instance.add_turbine(5.0, 5.0);
    let t2 = instance.add_turbine(1.0, 0.0);
    let t3 = instance.add_turbine(2.0, 0.0);
    let s = instance.add_substation(3.0, 0.0, 5);
    instance.add_edge(t0, t1);
    instance.add_edge(t1, s);
    instance.add_edge(t0, t2);
    instance.add_edge(t2, t3);
    instance.add_edge(t3, s);
    Windfarm::new(&instance)
}

/// A farm with an obvious leaf turbine: t0 routes over a long direct edge
/// although a short hop to its neighbour would reach another free
/// substation.
///
/// ```text
/// edge 0: t0 -> s2  (length 5)
/// edge 1: t0 -> t1  (length 1)
/// edge 2: t1 -> s3  (length 1)
/// ```
pub fn leaf_farm() -> Windfarm {
    let mut instance = Instance::with_default_cables(0, 1);
    let t0 = instance.add_turbine(0.0, 0.0);
    let t1 = instance.add_turbine(0.0, 1.0);
    let s2 = instance.add_substation(5.0, 0.0, 2);
    let s3 = instance.add_substation(0.0, 2.0, 2);
    instance.add_edge(t0, s2);
    instance.add_edge(t0, t1);
    instance.add_edge(t1, s3);
    Windfarm::new(&instance)
}

/// Six turbines on a line feeding one substation through a single chain,
/// so the last chain edges run close to the first cable breakpoint.
///
/// ```text
/// edge i (i in 0..5): t_i -> t_{i+1}  (length 1)
/// edge 5:             t5  -> s        (length 1)
/// ```
pub fn chain_farm() -> Windfarm {
    let mut instance = Instance::with_default_cables(0, 1);
    let turbines: Vec<VertexId> =
        (0..6).map(|i| instance.add_turbine(i as f64, 0.0)).collect();
    let s = instance.add_substation(6.0, 0.0, 10);
    for window in turbines.windows(2) {
        instance.add_edge(window[0], window[1]);
    }
    instance.add_edge(turbines[5], s);
    Windfarm::new(&instance)
}

/// Three turbines in a ring, one of them wired to the substation.
///
/// ```text
/// edge 0: t0 -> t1  (length 1)
/// edge 1: t1 -> t2  (length 1)
/// edge 2: t2 -> t0  (length ~1.4)
/// edge 3: t2 -> s   (length 1)
/// ```
pub fn turbine_ring_farm() -> Windfarm {
    let mut instance = Instance::with_default_cables(0, 1);
    let t0 = instance.add_turbine(0.0, 0.0);
    let t1 = instance.add_turbine(1.0, 0.0);
    let t2 = instance.add_turbine(1.0, 1.0);
    let s = instance.add_substation(2.0, 1.0, 5);
    instance.add_edge(t0, t1);
    instance.add_edge(t1, t2);
    instance.add_edge(t2, t0);
    instance.add_edge(t2, s);
    Windfarm::new(&instance)
}

/// Pushes one unit of flow along the walk and onto the drain edge of the
/// substation the walk ends in.
pub fn route_unit(farm: &mut Windfarm, walk: &[EdgeId]) {
    farm.add_flow_on_walk(walk, 1);
    let substation: VertexId = farm.end_vertex(*walk.last().expect("walk is non-empty"));
    let drain = farm.edge_to_super(substation);
    farm.add_flow(drain, 1);
}
