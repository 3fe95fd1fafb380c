//! # Reed-Solomon Check Codewords
//!
//! ECC200 uses GF(256) with the primitive polynomial
//! x^8 + x^5 + x^3 + x^2 + 1 (0x12D) and a generator polynomial whose roots
//! are 2^1 through 2^n.

/// Multiply two field elements (Russian peasant, reduced by 0x12D).
fn multiply(x: u8, y: u8) -> u8 {
    let mut z: u8 = 0;
    for i in (0..8).rev() {
        z = (z << 1) ^ ((z >> 7) * 0x2D);
        z ^= ((y >> i) & 1) * x;
    }
    z
}

/// Generator polynomial of degree `degree`, highest coefficient dropped,
/// coefficients from x^(degree-1) down to x^0.
fn divisor(degree: usize) -> Vec<u8> {
    let mut result = vec![0u8; degree - 1];
    result.push(1);
    let mut root: u8 = 2;
    for _ in 0..degree {
        // Multiply the current product by (x - root)
        for j in 0..degree {
            result[j] = multiply(result[j], root);
            if j + 1 < result.len() {
                result[j] ^= result[j + 1];
            }
        }
        root = multiply(root, 0x02);
    }
    result
}

/// Remainder of `data` * x^n divided by the generator: the check codewords.
fn remainder(data: &[u8], divisor: &[u8]) -> Vec<u8> {
    let mut result = vec![0u8; divisor.len()];
    for &b in data {
        let factor = b ^ result.remove(0);
        result.push(0);
        for (x, &y) in result.iter_mut().zip(divisor.iter()) {
            *x ^= multiply(y, factor);
        }
    }
    result
}

/// `ecc_len` check codewords for one block of data codewords.
pub fn check_codewords(data: &[u8], ecc_len: usize) -> Vec<u8> {
    if ecc_len == 0 {
        return Vec::new();
    }
    remainder(data, &divisor(ecc_len))
}
