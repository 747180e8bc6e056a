use credvault_crypto::{
    CryptoError, MessagePair, PrivateKey, PublicKey, decode_message_pair, decode_private_key,
    decode_public_key, encode_message_pair, encode_private_key, encode_public_key,
};
use num_bigint::BigUint;
use pretty_assertions::assert_eq;

fn big(v: u64) -> BigUint {
    BigUint::from(v)
}

#[test]
fn public_key_with_two_fields_is_format_error() {
    match decode_public_key("YQ==:Yg==") {
        Err(CryptoError::Format(msg)) => assert!(msg.contains("expected 3 fields"), "got: {msg}"),
        other => panic!("expected CryptoError::Format, got: {other:?}"),
    }
}

#[test]
fn private_key_scenario_round_trips() {
    let token = encode_private_key(&big(7), &big(3), &big(5), &big(2));
    assert_eq!(token.split(':').count(), 4);
    assert_eq!(
        decode_private_key(&token).unwrap(),
        (big(7), big(3), big(5), big(2))
    );
}

#[test]
fn typed_and_free_functions_agree() {
    let pk = PublicKey {
        p: big(23),
        g: big(5),
        y: big(8),
    };
    assert_eq!(pk.to_token(), encode_public_key(&pk.p, &pk.g, &pk.y));

    let pair = MessagePair {
        c1: b"first".to_vec(),
        c2: b"second".to_vec(),
    };
    assert_eq!(pair.to_token(), encode_message_pair(&pair.c1, &pair.c2));
    assert_eq!(MessagePair::from_token(&pair.to_token()).unwrap(), pair);
}

#[test]
fn large_integers_round_trip() {
    // 2048-bit modulus sized value
    let p = (BigUint::from(1u8) << 2047usize) + big(159);
    let token = encode_public_key(&p, &big(2), &(p.clone() - big(1)));
    let (p2, g2, y2) = decode_public_key(&token).unwrap();
    assert_eq!(p2, p);
    assert_eq!(g2, big(2));
    assert_eq!(y2, p - big(1));
}

#[test]
fn zero_encodes_as_single_zero_byte() {
    assert_eq!(
        encode_private_key(&big(0), &big(0), &big(0), &big(0)),
        "AA==:AA==:AA==:AA=="
    );
}

#[test]
fn message_pair_rejects_wrong_field_counts() {
    assert!(matches!(
        decode_message_pair("YQ=="),
        Err(CryptoError::Format(_))
    ));
    assert!(matches!(
        decode_message_pair("YQ==:Yg==:Yw=="),
        Err(CryptoError::Format(_))
    ));
}

#[test]
fn private_key_token_from_public_key_is_rejected() {
    assert!(matches!(
        PrivateKey::from_token("Bw==:Aw==:BQ=="),
        Err(CryptoError::Format(_))
    ));
}

#[test]
fn url_safe_alphabet_is_rejected() {
    // 0xfb 0xff encodes to "+/8=" in the standard alphabet.
    assert_eq!(encode_message_pair(&[0xfb, 0xff], &[]), "+/8=:");
    assert!(decode_message_pair("-_8=:").is_err());
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn biguint() -> impl Strategy<Value = BigUint> {
        proptest::collection::vec(any::<u8>(), 0..64).prop_map(|b| BigUint::from_bytes_be(&b))
    }

    proptest! {
        #[test]
        fn message_pair_round_trips(
            c1 in proptest::collection::vec(any::<u8>(), 0..128),
            c2 in proptest::collection::vec(any::<u8>(), 0..128),
        ) {
            let token = encode_message_pair(&c1, &c2);
            prop_assert_eq!(decode_message_pair(&token).unwrap(), (c1, c2));
        }

        #[test]
        fn public_key_round_trips(p in biguint(), g in biguint(), y in biguint()) {
            let token = encode_public_key(&p, &g, &y);
            prop_assert_eq!(token.matches(':').count(), 2);
            prop_assert_eq!(decode_public_key(&token).unwrap(), (p, g, y));
        }

        #[test]
        fn private_key_round_trips(p in biguint(), g in biguint(), y in biguint(), x in biguint()) {
            let token = encode_private_key(&p, &g, &y, &x);
            prop_assert_eq!(decode_private_key(&token).unwrap(), (p, g, y, x));
        }
    }
}
