//! End-to-end wall impedance scenarios.

use tlwall::prelude::*;

fn copper_chamber() -> Chamber {
    let copper = Layer::conductor(Thickness::finite(1.0e-3).expect("thickness"), 5.96e7)
        .expect("copper layer");
    Chamber::circular(0.022, 1.0)
        .expect("chamber")
        .with_layers(vec![copper], Boundary::Vacuum)
}

#[test]
fn lhc_like_copper_chamber_end_to_end() {
    let freqs = FrequencyGrid::logspace(1.0e3, 1.0e9, 120).expect("grid");
    let beam = Beam::from_gamma(7460.52).expect("beam");
    let wall = TlWall::new(copper_chamber(), beam, freqs).expect("engine");

    let zlong = wall.zlong().expect("ZLong");
    let ztrans = wall.ztrans().expect("ZTrans");

    assert_eq!(zlong.len(), 120);
    assert_eq!(ztrans.len(), 120);
    for (zl, zt) in zlong.iter().zip(ztrans.iter()) {
        assert!(zl.re.is_finite() && zl.im.is_finite());
        assert!(zt.re.is_finite() && zt.im.is_finite());
        assert!(zl.norm() > 0.0, "|ZLong| must be nonzero");
        assert!(zt.norm() > 0.0, "|ZTrans| must be nonzero");
    }

    // Resistive wall: positive real part across the whole band.
    assert!(zlong.iter().all(|z| z.re > 0.0));
}

#[test]
fn low_energy_beam_has_space_charge() {
    let freqs = FrequencyGrid::logspace(1.0e3, 1.0e8, 60).expect("grid");
    let beam = Beam::from_kinetic_energy_mev(50.0)
        .expect("beam")
        .with_test_beam_shift(2.0e-3)
        .expect("shift");
    let wall = TlWall::new(copper_chamber(), beam, freqs).expect("engine");

    let zlong_dsc = wall.zlong_dsc().expect("ZLongDSC");
    let zlong_isc = wall.zlong_isc().expect("ZLongISC");
    let ztrans_dsc = wall.ztrans_dsc().expect("ZTransDSC");
    let ztrans_isc = wall.ztrans_isc().expect("ZTransISC");

    // Direct terms are capacitive (negative imaginary part), indirect terms
    // inductive, and both vanish nowhere on this band at 50 MeV.
    assert!(zlong_dsc.iter().all(|z| z.im < 0.0));
    assert!(zlong_isc.iter().all(|z| z.im > 0.0));
    assert!(ztrans_dsc.iter().all(|z| z.im < 0.0));
    assert!(ztrans_isc.iter().all(|z| z.im > 0.0));

    // Totals are wall + indirect space charge, entry by entry.
    let zlong = wall.zlong().expect("ZLong");
    let total = wall.zlong_total().expect("ZLongTotal");
    for i in 0..zlong.len() {
        let sum = zlong[i] + zlong_isc[i];
        assert_eq!(total[i], sum);
    }
}

#[test]
fn on_axis_beam_uses_the_closed_form_transverse_isc() {
    let freqs = FrequencyGrid::logspace(1.0e3, 1.0e8, 40).expect("grid");
    let beam = Beam::from_gamma(2.0)
        .expect("beam")
        .with_test_beam_shift(0.0)
        .expect("shift");
    let wall = TlWall::new(copper_chamber(), beam, freqs).expect("engine");

    let ztrans_isc = wall.ztrans_isc().expect("ZTransISC");
    assert!(ztrans_isc.iter().all(|z| z.re.is_finite() && z.im.is_finite()));
    // The image term is inductive and nonzero for a finite-gamma beam.
    assert!(ztrans_isc.iter().any(|z| z.im > 0.0));
}

#[test]
fn aggregate_mapping_is_complete_and_aligned() {
    let freqs = FrequencyGrid::from_decades(3, 9, 2.0).expect("grid");
    let beam = Beam::from_gamma(7460.52).expect("beam");
    let wall = TlWall::new(copper_chamber(), beam, freqs).expect("engine");

    let map = wall.all_impedances().expect("aggregate");
    assert_eq!(map.len(), 22);
    let n = wall.frequencies().len();
    for values in map.values() {
        assert_eq!(values.len(), n);
    }
    for name in [
        "ZLong",
        "ZTrans",
        "ZDipX",
        "ZDipY",
        "ZQuadX",
        "ZQuadY",
        "ZLongSurf",
        "ZTransSurf",
        "ZLongDSC",
        "ZLongISC",
        "ZTransDSC",
        "ZTransISC",
        "ZDipDSC",
        "ZDipISC",
        "ZQuadDSC",
        "ZQuadISC",
        "ZLongTotal",
        "ZTransTotal",
        "ZDipXTotal",
        "ZDipYTotal",
        "ZQuadXTotal",
        "ZQuadYTotal",
    ] {
        assert!(map.contains_key(name), "missing {name}");
    }
}
