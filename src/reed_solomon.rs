//! Systematic Reed-Solomon codec over GF(2^8).
//!
//! Neither this codebase nor the reference implementation pulls in an
//! ecosystem Reed-Solomon crate — the reference vendors its own header-only
//! RS library rather than depending on a package, so this module is
//! hand-rolled the same way: log/antilog tables over the standard
//! `x^8 + x^4 + x^3 + x^2 + 1` field polynomial, a systematic generator
//! built from `(x - g^i)` roots, syndrome-based error detection, and
//! Berlekamp-Massey + Forney correction.

use crate::errors::RsError;

const FIELD_SIZE: usize = 256;
const GENERATOR_POLY: u16 = 0x11D; // x^8 + x^4 + x^3 + x^2 + 1

struct GaloisField {
    exp: [u8; 512],
    log: [u8; FIELD_SIZE],
}

impl GaloisField {
    fn new() -> Self {
        let mut exp = [0u8; 512];
        let mut log = [0u8; FIELD_SIZE];
        let mut x: u16 = 1;
        for i in 0..255 {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= GENERATOR_POLY;
            }
        }
        for i in 255..512 {
            exp[i] = exp[i - 255];
        }
        Self { exp, log }
    }

    fn mul(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize as usize + self.log[b as usize] as usize]
    }

    fn div(&self, a: u8, b: u8) -> u8 {
        assert!(b != 0, "division by zero in GF(256)");
        if a == 0 {
            return 0;
        }
        let diff = (self.log[a as usize] as i32 - self.log[b as usize] as i32).rem_euclid(255);
        self.exp[diff as usize]
    }

    fn pow(&self, a: u8, n: i32) -> u8 {
        if n == 0 {
            return 1;
        }
        if a == 0 {
            return 0;
        }
        let e = ((self.log[a as usize] as i32 * n) % 255 + 255) % 255;
        self.exp[e as usize]
    }

    fn inv(&self, a: u8) -> u8 {
        assert!(a != 0, "no inverse for zero in GF(256)");
        self.exp[(255 - self.log[a as usize] as i32) as usize]
    }

    fn poly_mul(&self, p: &[u8], q: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; p.len() + q.len() - 1];
        for (i, &pi) in p.iter().enumerate() {
            if pi == 0 {
                continue;
            }
            for (j, &qj) in q.iter().enumerate() {
                out[i + j] ^= self.mul(pi, qj);
            }
        }
        out
    }

    fn poly_eval(&self, p: &[u8], x: u8) -> u8 {
        let mut y = p[0];
        for &c in &p[1..] {
            y = self.mul(y, x) ^ c;
        }
        y
    }

    /// Generator polynomial with `t` roots `g^0 .. g^(t-1)`, most significant
    /// coefficient first.
    fn generator_poly(&self, t: usize) -> Vec<u8> {
        let mut g = vec![1u8];
        for i in 0..t {
            g = self.poly_mul(&g, &[1, self.pow(2, i as i32)]);
        }
        g
    }
}

/// Systematic RS(n, k) codec: `n = k + 2t` parity bytes appended after the
/// `k` message bytes.
pub struct ReedSolomon {
    gf: GaloisField,
    k: usize,
    t: usize,
}

impl ReedSolomon {
    /// `k` message bytes, `t` error-correcting capacity (parity length is
    /// `2*t`).
    pub fn new(k: usize, t: usize) -> Self {
        Self {
            gf: GaloisField::new(),
            k,
            t,
        }
    }

    pub fn n(&self) -> usize {
        self.k + 2 * self.t
    }

    /// Encodes `payload` (length `k`) into a codeword of length `n`, payload
    /// bytes preserved verbatim followed by `2t` parity bytes.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        assert_eq!(payload.len(), self.k, "payload length must equal k");
        if self.t == 0 {
            return payload.to_vec();
        }

        let generator = self.gf.generator_poly(self.t);

        // Long division of payload*x^(2t) by the generator; remainder is parity.
        let mut remainder = payload.to_vec();
        remainder.extend(std::iter::repeat(0u8).take(2 * self.t));

        for i in 0..payload.len() {
            let coef = remainder[i];
            if coef == 0 {
                continue;
            }
            for (j, &g) in generator.iter().enumerate() {
                remainder[i + j] ^= self.gf.mul(g, coef);
            }
        }

        let mut codeword = payload.to_vec();
        codeword.extend_from_slice(&remainder[payload.len()..]);
        codeword
    }

    /// Decodes a possibly corrupted codeword of length `n`, returning the
    /// original `k` payload bytes. Returns [`RsError::Uncorrectable`] when
    /// the syndromes cannot be driven to zero within capacity `t`.
    pub fn decode(&self, codeword: &[u8]) -> Result<Vec<u8>, RsError> {
        if codeword.len() != self.n() {
            return Err(RsError::WrongLength {
                len: codeword.len(),
                expected: self.n(),
            });
        }
        if self.t == 0 {
            return Ok(codeword.to_vec());
        }

        let syndromes = self.syndromes(codeword);
        if syndromes.iter().all(|&s| s == 0) {
            return Ok(codeword[..self.k].to_vec());
        }

        let locator = self.berlekamp_massey(&syndromes)?;
        let error_positions = self.find_error_positions(&locator, codeword.len())?;
        let corrected = self.correct_errors(codeword, &syndromes, &locator, &error_positions)?;

        let check = self.syndromes(&corrected);
        if !check.iter().all(|&s| s == 0) {
            return Err(RsError::Uncorrectable);
        }

        Ok(corrected[..self.k].to_vec())
    }

    fn syndromes(&self, codeword: &[u8]) -> Vec<u8> {
        // Treat codeword as a polynomial, most-significant coefficient first.
        (0..2 * self.t)
            .map(|i| {
                let root = self.gf.pow(2, i as i32);
                self.gf.poly_eval(codeword, root)
            })
            .collect()
    }

    fn berlekamp_massey(&self, syndromes: &[u8]) -> Result<Vec<u8>, RsError> {
        let gf = &self.gf;
        let mut c = vec![1u8]; // error locator, constant-term first
        let mut b = vec![1u8];
        let mut l = 0usize;
        let mut m = 1i32;
        let mut bb = 1u8;

        for n in 0..syndromes.len() {
            let mut delta = syndromes[n];
            for i in 1..=l {
                delta ^= gf.mul(c[i], syndromes[n - i]);
            }

            if delta == 0 {
                m += 1;
            } else if 2 * l <= n {
                let t_poly = c.clone();
                let coef = gf.div(delta, bb);
                let mut shifted = vec![0u8; m as usize];
                shifted.extend_from_slice(&b);
                extend_xor(&mut c, &shifted, coef, gf);
                l = n + 1 - l;
                b = t_poly;
                bb = delta;
                m = 1;
            } else {
                let coef = gf.div(delta, bb);
                let mut shifted = vec![0u8; m as usize];
                shifted.extend_from_slice(&b);
                extend_xor(&mut c, &shifted, coef, gf);
                m += 1;
            }
        }

        if l > self.t {
            return Err(RsError::TooManyErrors { degree: l, t: self.t });
        }

        Ok(c)
    }

    fn find_error_positions(&self, locator: &[u8], n: usize) -> Result<Vec<usize>, RsError> {
        let gf = &self.gf;
        let mut positions = Vec::new();
        for i in 0..n {
            let x_inv = gf.pow(2, i as i32);
            let x_inv = gf.inv(x_inv);
            let mut y = locator[0];
            let mut pow = 1u8;
            for &c in &locator[1..] {
                pow = gf.mul(pow, x_inv);
                y ^= gf.mul(c, pow);
            }
            if y == 0 {
                positions.push(n - 1 - i);
            }
        }

        let degree = locator.len() - 1;
        if positions.len() != degree {
            return Err(RsError::Uncorrectable);
        }
        Ok(positions)
    }

    fn correct_errors(
        &self,
        codeword: &[u8],
        syndromes: &[u8],
        locator: &[u8],
        error_positions: &[usize],
    ) -> Result<Vec<u8>, RsError> {
        let gf = &self.gf;
        let n = codeword.len();

        // Error evaluator polynomial: Omega(x) = S(x)*Lambda(x) mod x^(2t).
        let mut syndrome_poly = syndromes.to_vec();
        syndrome_poly.reverse(); // low-degree-first for poly_mul convenience
        let mut locator_low_first = locator.to_vec();
        locator_low_first.reverse();
        let full = gf.poly_mul(&syndrome_poly, &locator_low_first);
        let omega: Vec<u8> = full.into_iter().take(2 * self.t).collect();

        // Formal derivative of Lambda(x), low-degree-first.
        let mut lambda_prime = Vec::new();
        for (i, &c) in locator_low_first.iter().enumerate().skip(1) {
            if i % 2 == 1 {
                lambda_prime.push(c);
            }
        }
        if lambda_prime.is_empty() {
            lambda_prime.push(0);
        }

        let mut corrected = codeword.to_vec();
        for &pos in error_positions {
            if pos >= n {
                return Err(RsError::Uncorrectable);
            }
            let i = n - 1 - pos;
            let x_inv = gf.inv(gf.pow(2, i as i32));

            let omega_at = eval_low_first(gf, &omega, x_inv);
            let lambda_prime_at = eval_low_first(gf, &lambda_prime, x_inv);
            if lambda_prime_at == 0 {
                return Err(RsError::Uncorrectable);
            }

            let x_i = gf.pow(2, i as i32);
            let magnitude = gf.mul(x_i, gf.div(omega_at, lambda_prime_at));
            corrected[pos] ^= magnitude;
        }

        Ok(corrected)
    }
}

fn eval_low_first(gf: &GaloisField, poly_low_first: &[u8], x: u8) -> u8 {
    let mut y = 0u8;
    let mut pow = 1u8;
    for &c in poly_low_first {
        y ^= gf.mul(c, pow);
        pow = gf.mul(pow, x);
    }
    y
}

/// `c += coef * shifted`, extending `c` if `shifted` is longer.
fn extend_xor(c: &mut Vec<u8>, shifted: &[u8], coef: u8, gf: &GaloisField) {
    if shifted.len() > c.len() {
        c.resize(shifted.len(), 0);
    }
    for (i, &s) in shifted.iter().enumerate() {
        c[i] ^= gf.mul(coef, s);
    }
}

/// ECC bytes as a function of payload length, per the normative formula.
pub fn ecc_bytes_for_length(len: usize) -> usize {
    if len < 4 {
        2
    } else {
        (2 * (len / 5)).max(4)
    }
}
