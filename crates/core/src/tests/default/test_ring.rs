use std::sync::Arc;

use super::expected_successor;
use super::gen_ring;
use super::run_rounds;
use crate::dht::Chord;
use crate::dht::ChordStorage;
use crate::dht::Id;
use crate::dht::PeerRing;
use crate::error::Error;
use crate::error::Result;

const IDS: [u64; 7] = [3, 7, 8, 12, 21, 27, 30];

fn node(nodes: &[Arc<PeerRing>], id: u64) -> &Arc<PeerRing> {
    nodes
        .iter()
        .find(|n| n.id == Id::new(id))
        .expect("node not in ring")
}

/// Successor and predecessor pointers of `nodes` form the sorted cycle of `ids`.
fn assert_sorted_cycle(nodes: &[Arc<PeerRing>], ids: &[u64]) -> Result<()> {
    let mut sorted = ids.to_vec();
    sorted.sort();
    for (i, id) in sorted.iter().enumerate() {
        let next = sorted[(i + 1) % sorted.len()];
        let prev = sorted[(i + sorted.len() - 1) % sorted.len()];
        let n = node(nodes, *id);
        assert_eq!(n.successor()?, Some(Id::new(next)), "successor of {id}");
        assert_eq!(n.predecessor()?, Some(Id::new(prev)), "predecessor of {id}");
    }
    Ok(())
}

#[tokio::test]
async fn test_seven_nodes_lookup() -> Result<()> {
    let (_registry, nodes) = gen_ring(5, &IDS, 11).await?;

    assert_eq!(
        node(&nodes, 12).find_predecessor(Id::new(17)).await?,
        Id::new(12)
    );
    assert_eq!(
        node(&nodes, 21).find_predecessor(Id::new(1)).await?,
        Id::new(30)
    );
    assert_eq!(
        node(&nodes, 21).closest_preceding_node(Id::new(30))?,
        Id::new(27)
    );
    assert_eq!(
        node(&nodes, 12).closest_preceding_node(Id::new(17))?,
        Id::new(12)
    );
    assert_eq!(
        node(&nodes, 7).find_successor(Id::new(9)).await?,
        Id::new(12)
    );
    Ok(())
}

#[tokio::test]
async fn test_seven_nodes_form_sorted_cycle() -> Result<()> {
    let (_registry, nodes) = gen_ring(5, &IDS, 11).await?;
    assert_sorted_cycle(&nodes, &IDS)
}

#[tokio::test]
async fn test_find_successor_from_every_node() -> Result<()> {
    let (_registry, nodes) = gen_ring(5, &IDS, 11).await?;
    for n in nodes.iter() {
        for key in 0..32 {
            assert_eq!(
                n.find_successor(Id::new(key)).await?,
                expected_successor(&IDS, key),
                "find_successor({key}) on {}",
                n.id
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_default_space_ring() -> Result<()> {
    let ids = [1, 17, 33, 40, 62];
    let (_registry, nodes) = gen_ring(6, &ids, 12).await?;
    assert_sorted_cycle(&nodes, &ids)?;
    for key in [0, 1, 2, 18, 39, 41, 63] {
        assert_eq!(
            nodes[2].find_successor(Id::new(key)).await?,
            expected_successor(&ids, key)
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_join_then_leave_restores_ring() -> Result<()> {
    let base = [3, 12, 21, 27];
    let (registry, mut nodes) = gen_ring(5, &base, 11).await?;
    assert_sorted_cycle(&nodes, &base)?;

    let joiner = registry.spawn(8, 5)?;
    joiner.join(Some(Id::new(3))).await?;
    nodes.push(joiner.clone());
    run_rounds(&nodes, 11).await?;
    assert_sorted_cycle(&nodes, &[3, 8, 12, 21, 27])?;

    // 9 and 10 are now owned by 12, 5 by the joiner
    assert!(nodes[0].create_info(Id::new(5), "five".to_string()).await?);
    assert_eq!(
        joiner.local_information(Id::new(5)).await?,
        Some("five".to_string())
    );

    joiner.leave().await?;
    registry.kill(joiner.id);
    nodes.pop();
    run_rounds(&nodes, 11).await?;
    assert_sorted_cycle(&nodes, &base)?;

    for n in nodes.iter() {
        assert_eq!(
            n.get_information(Id::new(5)).await?,
            Some("five".to_string())
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_leave_of_twelve() -> Result<()> {
    let (_registry, nodes) = gen_ring(5, &IDS, 11).await?;
    node(&nodes, 12).leave().await?;
    assert_eq!(node(&nodes, 21).predecessor()?, Some(Id::new(8)));
    assert_eq!(node(&nodes, 8).successor()?, Some(Id::new(21)));
    Ok(())
}

#[tokio::test]
async fn test_ring_heals_after_crash() -> Result<()> {
    let (registry, mut nodes) = gen_ring(5, &IDS, 11).await?;

    registry.kill(Id::new(21));
    nodes.retain(|n| n.id != Id::new(21));
    run_rounds(&nodes, 11).await?;

    let alive = [3, 7, 8, 12, 27, 30];
    assert_sorted_cycle(&nodes, &alive)?;
    for n in nodes.iter() {
        assert!(!n.state()?.finger.contains(Some(Id::new(21))));
        assert_eq!(n.find_successor(Id::new(15)).await?, Id::new(27));
    }
    Ok(())
}

#[tokio::test]
async fn test_keys_outside_the_space_are_rejected() -> Result<()> {
    let (_registry, nodes) = gen_ring(5, &IDS, 11).await?;
    let n3 = node(&nodes, 3);

    assert_eq!(n3.find_successor(Id::new(4)).await?, Id::new(7));
    // 36 and 100 would alias 4 in a 5-bit ring
    assert!(matches!(
        n3.find_successor(Id::new(36)).await,
        Err(Error::IdOutOfRange(36, 5))
    ));
    assert!(matches!(
        n3.create_info(Id::new(100), "x".to_string()).await,
        Err(Error::IdOutOfRange(100, 5))
    ));
    assert!(matches!(
        n3.get_information(Id::new(100)).await,
        Err(Error::IdOutOfRange(100, 5))
    ));
    assert!(matches!(
        n3.add_information(Id::new(32), "x").await,
        Err(Error::IdOutOfRange(32, 5))
    ));
    assert!(matches!(
        n3.notify(Id::new(40)).await,
        Err(Error::IdOutOfRange(40, 5))
    ));
    for n in nodes.iter() {
        assert_eq!(n.storage.count().await?, 0);
    }
    Ok(())
}
