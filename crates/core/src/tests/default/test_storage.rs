use super::gen_ring;
use super::run_rounds;
use crate::dht::Chord;
use crate::dht::ChordStorage;
use crate::dht::Id;
use crate::error::Result;

#[tokio::test]
async fn test_create_get_remove_info() -> Result<()> {
    let (_registry, nodes) = gen_ring(5, &[3, 7, 8, 12, 21, 27, 30], 11).await?;
    let n12 = &nodes[3];
    let n21 = &nodes[4];

    assert_eq!(n12.local_information(Id::new(14)).await?, None);
    assert_eq!(n21.local_information(Id::new(15)).await?, None);

    assert!(n21.create_info(Id::new(15), "abc".to_string()).await?);
    assert_eq!(
        n21.local_information(Id::new(15)).await?,
        Some("abc".to_string())
    );
    for n in nodes.iter() {
        assert_eq!(
            n.get_information(Id::new(15)).await?,
            Some("abc".to_string())
        );
    }

    // second create fails from anywhere and keeps the first value
    assert!(!nodes[0].create_info(Id::new(15), "xyz".to_string()).await?);
    assert_eq!(
        n21.local_information(Id::new(15)).await?,
        Some("abc".to_string())
    );

    assert!(nodes[1].remove_info(Id::new(15)).await?);
    assert_eq!(n21.local_information(Id::new(15)).await?, None);
    assert_eq!(n12.get_information(Id::new(15)).await?, None);
    assert!(!n21.remove_info(Id::new(15)).await?);
    Ok(())
}

#[tokio::test]
async fn test_create_info_from_remote_node() -> Result<()> {
    let (_registry, nodes) = gen_ring(5, &[3, 7, 8, 12, 21, 27, 30], 11).await?;
    let n3 = &nodes[0];
    let n30 = &nodes[6];

    // 31 wraps around to 3
    assert!(n30.create_info(Id::new(31), "wrapped".to_string()).await?);
    assert_eq!(
        n3.local_information(Id::new(31)).await?,
        Some("wrapped".to_string())
    );
    assert_eq!(n30.local_information(Id::new(31)).await?, None);
    Ok(())
}

#[tokio::test]
async fn test_ownership_is_lazy() -> Result<()> {
    let (registry, mut nodes) = gen_ring(5, &[3, 12, 21], 11).await?;
    let n21 = nodes[2].clone();

    // 15 is owned by 21 until 17 shows up
    assert!(nodes[0].create_info(Id::new(15), "abc".to_string()).await?);
    assert_eq!(
        n21.local_information(Id::new(15)).await?,
        Some("abc".to_string())
    );

    let n17 = registry.spawn(17, 5)?;
    n17.join(Some(Id::new(3))).await?;
    nodes.push(n17.clone());
    run_rounds(&nodes, 11).await?;

    assert_eq!(nodes[0].find_successor(Id::new(15)).await?, Id::new(17));
    // the value did not move, and routing now ends at the new owner
    assert_eq!(
        n21.local_information(Id::new(15)).await?,
        Some("abc".to_string())
    );
    assert_eq!(nodes[0].get_information(Id::new(15)).await?, None);
    Ok(())
}
