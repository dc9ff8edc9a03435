//! Shamir-share helpers for signing quorums
//!
//! Shareholder ids double as Shamir evaluation points, so a coefficient for
//! id `i` interpolates at zero over the points of the signing quorum.

use std::collections::BTreeMap;

use k256::Scalar;

use crate::error::{Error, Result};
use crate::types::ShareholderId;

/// Lagrange coefficient at zero for `id` over the given quorum.
pub fn lagrange_coefficient(id: ShareholderId, quorum: &[ShareholderId]) -> Result<Scalar> {
    validate_quorum_ids(quorum)?;
    if !quorum.contains(&id) {
        return Err(Error::InvalidArgument(format!(
            "shareholder {id} is not in the signing quorum"
        )));
    }

    let xi = Scalar::from(id);
    let mut numerator = Scalar::ONE;
    let mut denominator = Scalar::ONE;
    for &other in quorum {
        if other == id {
            continue;
        }
        let xj = Scalar::from(other);
        numerator *= xj;
        denominator *= xj - xi;
    }

    let inverted = Option::<Scalar>::from(denominator.invert())
        .ok_or_else(|| Error::Crypto("lagrange denominator is not invertible".into()))?;
    Ok(numerator * inverted)
}

fn validate_quorum_ids(quorum: &[ShareholderId]) -> Result<()> {
    for (i, &id) in quorum.iter().enumerate() {
        if id == 0 {
            return Err(Error::InvalidArgument(
                "shareholder id zero is reserved".into(),
            ));
        }
        if quorum[..i].contains(&id) {
            return Err(Error::InvalidArgument(format!(
                "duplicate shareholder id {id} in signing quorum"
            )));
        }
    }
    Ok(())
}

/// Coefficients at zero for every member of the quorum.
pub fn lagrange_coefficients(
    quorum: &[ShareholderId],
) -> Result<BTreeMap<ShareholderId, Scalar>> {
    quorum
        .iter()
        .map(|&id| Ok((id, lagrange_coefficient(id, quorum)?)))
        .collect()
}

/// Convert a Shamir share value into its additive form for one quorum.
pub fn to_additive_share(
    value: &Scalar,
    id: ShareholderId,
    quorum: &[ShareholderId],
) -> Result<Scalar> {
    Ok(*value * lagrange_coefficient(id, quorum)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::elliptic_curve::Field;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn additive_shares_reconstruct_the_secret() {
        let mut rng = StdRng::seed_from_u64(51);
        let secret = Scalar::random(&mut rng);
        let slope = Scalar::random(&mut rng);
        let share = |id: u64| secret + slope * Scalar::from(id);

        for quorum in [[1u64, 2], [2, 3], [1, 3]] {
            let sum: Scalar = quorum
                .iter()
                .map(|&id| to_additive_share(&share(id), id, &quorum).unwrap())
                .sum();
            assert_eq!(sum, secret);
        }
    }

    #[test]
    fn coefficients_cover_the_quorum() {
        let coefficients = lagrange_coefficients(&[1, 2]).unwrap();
        assert_eq!(coefficients.len(), 2);
        // pair {1, 2}: λ1 = 2, λ2 = -1
        assert_eq!(coefficients[&1], Scalar::from(2u64));
        assert_eq!(coefficients[&2], -Scalar::ONE);
    }

    #[test]
    fn rejects_outsiders_and_duplicates() {
        assert!(lagrange_coefficient(4, &[1, 2]).is_err());
        assert!(lagrange_coefficient(1, &[1, 1]).is_err());
    }
}
