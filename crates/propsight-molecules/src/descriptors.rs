//! Physicochemical descriptors computed from a parsed graph.

use crate::element::HYDROGEN_MASS;
use crate::smiles::Mol;

/// Average molecular weight in g/mol, hydrogens included.
pub fn molecular_weight(mol: &Mol) -> f64 {
    mol.atoms
        .iter()
        .map(|a| a.element.map(|e| e.mass).unwrap_or(0.0) + f64::from(a.hydrogens) * HYDROGEN_MASS)
        .sum()
}

/// Lipinski acceptors: nitrogen and oxygen atoms.
pub fn hydrogen_bond_acceptors(mol: &Mol) -> usize {
    mol.atoms
        .iter()
        .filter(|a| matches!(a.atomic_number(), 7 | 8))
        .count()
}

/// Lipinski donors: nitrogen and oxygen atoms carrying at least one hydrogen.
pub fn hydrogen_bond_donors(mol: &Mol) -> usize {
    mol.atoms
        .iter()
        .filter(|a| matches!(a.atomic_number(), 7 | 8) && a.hydrogens > 0)
        .count()
}

/// Topological polar surface area (Ertl 2000), N/O/S/P fragment values.
pub fn tpsa(mol: &Mol) -> f64 {
    (0..mol.atom_count()).map(|i| tpsa_contribution(mol, i)).sum()
}

fn tpsa_contribution(mol: &Mol, i: usize) -> f64 {
    let atom = &mol.atoms[i];
    let h = atom.hydrogens;
    let degree = mol.degree(i);
    let has_double = mol.has_double_bond(i);

    match atom.atomic_number() {
        7 => {
            if atom.charge > 0 {
                return match h {
                    0 => 0.0,
                    1 => 23.47,
                    2 => 25.59,
                    _ => 27.64,
                };
            }
            if atom.aromatic {
                return if h >= 1 { 15.79 } else { 12.89 };
            }
            match (degree, h, has_double) {
                (1, 2, _) => 26.02,
                (2, 1, false) => 19.15,
                (2, 1, true) => 23.85,
                (2, 0, true) => 12.36,
                (3, 0, _) => 3.24,
                (1, 0, _) if mol.bond_order_sum(i) == 3 => 23.79,
                _ if h >= 2 => 26.02,
                _ if h == 1 => 19.15,
                _ => 3.24,
            }
        }
        8 => {
            if atom.charge < 0 {
                return 23.06;
            }
            if atom.aromatic {
                return 13.14;
            }
            match (degree, h, has_double) {
                (1, 1, false) => 20.23,
                (1, 0, true) => 17.07,
                (2, 0, false) => 9.23,
                _ if h >= 1 => 20.23,
                _ if has_double => 17.07,
                _ => 9.23,
            }
        }
        16 => {
            if h >= 1 {
                38.80
            } else if has_double || degree >= 2 {
                25.30
            } else {
                0.0
            }
        }
        15 => {
            if has_double {
                34.14
            } else if h >= 1 {
                23.47
            } else {
                9.81
            }
        }
        _ => 0.0,
    }
}

/// Simplified Wildman-Crippen logP.
pub fn crippen_logp(mol: &Mol) -> f64 {
    let in_ring = mol.ring_atoms();
    let mut logp = 0.0;
    for i in 0..mol.atom_count() {
        logp += crippen_contribution(mol, i, in_ring[i]);
        let h = f64::from(mol.atoms[i].hydrogens);
        if mol.atoms[i].atomic_number() == 6 {
            logp += h * 0.1230;
        } else {
            logp += h * -0.2677;
        }
    }
    logp
}

fn crippen_contribution(mol: &Mol, i: usize, in_ring: bool) -> f64 {
    let atom = &mol.atoms[i];
    let has_double = mol.has_double_bond(i);
    let hetero_neighbour = mol
        .neighbors(i)
        .iter()
        .any(|&(n, _)| !matches!(mol.atoms[n].atomic_number(), 1 | 6));

    match atom.atomic_number() {
        6 => {
            if atom.aromatic {
                if hetero_neighbour { -0.14 } else { 0.296 }
            } else if has_double {
                if hetero_neighbour { -0.03 } else { 0.08 }
            } else if in_ring {
                0.1441
            } else {
                match mol.degree(i) {
                    0..=2 => 0.1441,
                    3 => 0.0,
                    _ => -0.04,
                }
            }
        }
        7 => {
            if atom.aromatic {
                -0.3187
            } else if atom.charge > 0 {
                -1.0190
            } else if has_double {
                -0.5262
            } else {
                -0.4458
            }
        }
        8 => {
            if atom.charge < 0 {
                -1.189
            } else if has_double {
                -0.3339
            } else if mol.degree(i) >= 2 {
                -0.2893
            } else {
                -0.3567
            }
        }
        9 => 0.4118,
        15 => 0.2836,
        16 => {
            if has_double {
                -0.1084
            } else if atom.charge != 0 {
                -0.5188
            } else {
                0.6237
            }
        }
        17 => 0.6895,
        35 => 0.8813,
        53 => 1.050,
        _ => 0.0,
    }
}
