use super::*;

#[test]
fn test_delta_new() {
    let delta: Delta<u64> = Delta::U {
        delta: 0x1234,
        seqno: 1,
    };
    assert_eq!(delta.to_seqno(), 1);

    let delta: Delta<u64> = Delta::D { seqno: 2 };
    assert_eq!(delta.to_seqno(), 2);
}
